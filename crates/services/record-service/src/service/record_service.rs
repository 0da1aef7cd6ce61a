//! Federated record store - one logical collection over every backend.
//!
//! The store is a stateless router: single-record operations go to the
//! adapter named by the caller's backend selector, and listings read every
//! adapter and merge the results into one id-ordered sequence.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use common::{AppError, AppResult, CallContext, Operation, StoreResultExt};
use domain::{new_record_id, Backend, Record, RecordInput};

use crate::repository::RecordRepository;

/// How `list_all` issues its backend scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListStrategy {
    /// One backend after the other, in listing order
    #[default]
    Sequential,
    /// All backends at once, joined before the merge
    Concurrent,
}

impl FromStr for ListStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ListStrategy::Sequential),
            "concurrent" => Ok(ListStrategy::Concurrent),
            other => Err(AppError::configuration(format!(
                "unknown list strategy '{}', expected 'sequential' or 'concurrent'",
                other
            ))),
        }
    }
}

/// Record service trait for dependency injection.
///
/// Selectors are raw backend tags as received from the caller; every
/// operation validates them before touching any store.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Assign a fresh id and persist a new record in the selected backend
    async fn create(&self, ctx: &CallContext, input: RecordInput, selector: i32)
        -> AppResult<Record>;

    /// Replace name, email and phone of a record in the selected backend
    async fn update(
        &self,
        ctx: &CallContext,
        id: &str,
        input: RecordInput,
        selector: i32,
    ) -> AppResult<Record>;

    /// Remove a record from the selected backend
    async fn delete(&self, ctx: &CallContext, id: &str, selector: i32) -> AppResult<()>;

    /// Fetch a record from the selected backend
    async fn get(&self, ctx: &CallContext, id: &str, selector: i32) -> AppResult<Record>;

    /// Every record of every backend, ordered by id
    async fn list_all(&self, ctx: &CallContext) -> AppResult<Vec<Record>>;

    /// Ping every backend
    async fn health(&self, ctx: &CallContext) -> Vec<(Backend, AppResult<()>)>;
}

/// Concrete implementation of RecordService over one adapter per backend.
pub struct FederatedRecordStore {
    adapters: HashMap<Backend, Arc<dyn RecordRepository>>,
    strategy: ListStrategy,
}

impl FederatedRecordStore {
    /// Create a store from one adapter per backend.
    ///
    /// Fails with `Configuration` if an adapter is passed in the wrong slot.
    pub fn new(
        relational: Arc<dyn RecordRepository>,
        key_value: Arc<dyn RecordRepository>,
    ) -> AppResult<Self> {
        let mut adapters = HashMap::with_capacity(Backend::ALL.len());
        for (expected, adapter) in [(Backend::Relational, relational), (Backend::KeyValue, key_value)] {
            if adapter.backend() != expected {
                return Err(AppError::configuration(format!(
                    "adapter for {} registered in the {} slot",
                    adapter.backend(),
                    expected
                )));
            }
            adapters.insert(expected, adapter);
        }

        Ok(Self {
            adapters,
            strategy: ListStrategy::default(),
        })
    }

    /// Use `strategy` for listings.
    pub fn with_strategy(mut self, strategy: ListStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ListStrategy {
        self.strategy
    }

    /// Resolve a raw selector to its backend and adapter.
    fn route(&self, selector: i32) -> AppResult<(Backend, &Arc<dyn RecordRepository>)> {
        let backend = Backend::try_from(selector)?;
        let adapter = self
            .adapters
            .get(&backend)
            .ok_or(AppError::InvalidBackend(selector))?;
        Ok((backend, adapter))
    }

    fn adapter(&self, backend: Backend) -> AppResult<&Arc<dyn RecordRepository>> {
        self.adapters
            .get(&backend)
            .ok_or(AppError::InvalidBackend(backend.tag()))
    }

    async fn scan(&self, ctx: &CallContext, backend: Backend) -> AppResult<Vec<Record>> {
        let records = self
            .adapter(backend)?
            .list_all(ctx)
            .await
            .in_store(backend, Operation::ListAll)?;
        debug!(%backend, count = records.len(), "Backend scanned");
        Ok(records)
    }

    async fn scan_sequential(&self, ctx: &CallContext) -> AppResult<Vec<Record>> {
        let mut records = Vec::new();
        for backend in Backend::ALL {
            records.extend(self.scan(ctx, backend).await?);
        }
        Ok(records)
    }

    async fn scan_concurrent(&self, ctx: &CallContext) -> AppResult<Vec<Record>> {
        let (relational, key_value) = futures::future::try_join(
            self.scan(ctx, Backend::Relational),
            self.scan(ctx, Backend::KeyValue),
        )
        .await?;

        let mut records = relational;
        records.extend(key_value);
        Ok(records)
    }
}

#[async_trait]
impl RecordService for FederatedRecordStore {
    async fn create(
        &self,
        ctx: &CallContext,
        input: RecordInput,
        selector: i32,
    ) -> AppResult<Record> {
        // Selector is checked before an id is minted or any store is touched
        let (backend, adapter) = self.route(selector)?;
        let record = Record::new(new_record_id(), input, backend);
        debug!(%backend, id = %record.id, "Creating record");

        adapter
            .create(ctx, &record)
            .await
            .in_store(backend, Operation::Create)?;
        Ok(record)
    }

    async fn update(
        &self,
        ctx: &CallContext,
        id: &str,
        input: RecordInput,
        selector: i32,
    ) -> AppResult<Record> {
        let (backend, adapter) = self.route(selector)?;
        let record = Record::new(id.to_string(), input, backend);
        debug!(%backend, id, "Updating record");

        adapter
            .update(ctx, &record)
            .await
            .in_store(backend, Operation::Update)?;
        Ok(record)
    }

    async fn delete(&self, ctx: &CallContext, id: &str, selector: i32) -> AppResult<()> {
        let (backend, adapter) = self.route(selector)?;
        debug!(%backend, id, "Deleting record");

        adapter
            .delete(ctx, id)
            .await
            .in_store(backend, Operation::Delete)
    }

    async fn get(&self, ctx: &CallContext, id: &str, selector: i32) -> AppResult<Record> {
        let (backend, adapter) = self.route(selector)?;

        adapter.read(ctx, id).await.in_store(backend, Operation::Read)
    }

    async fn list_all(&self, ctx: &CallContext) -> AppResult<Vec<Record>> {
        let scanned = match self.strategy {
            ListStrategy::Sequential => self.scan_sequential(ctx).await,
            ListStrategy::Concurrent => self.scan_concurrent(ctx).await,
        };

        // Fail fast: a partial federated view is never returned
        if let Err(err) = &scanned {
            warn!(error = %err, "Federated listing aborted");
        }
        let mut records = scanned?;

        // Stable: equal ids keep backend listing order
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn health(&self, ctx: &CallContext) -> Vec<(Backend, AppResult<()>)> {
        let mut report = Vec::with_capacity(Backend::ALL.len());
        for backend in Backend::ALL {
            let status = match self.adapter(backend) {
                Ok(adapter) => adapter.ping(ctx).await.in_store(backend, Operation::Ping),
                Err(err) => Err(err),
            };
            report.push((backend, status));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{always, eq};

    use crate::repository::MockRecordRepository;

    fn mock(backend: Backend) -> MockRecordRepository {
        let mut repo = MockRecordRepository::new();
        repo.expect_backend().return_const(backend);
        repo
    }

    fn record(id: &str, name: &str, backend: Backend) -> Record {
        Record::new(
            id.to_string(),
            RecordInput::new(name, format!("{}@x.com", name), "555"),
            backend,
        )
    }

    fn store(relational: MockRecordRepository, key_value: MockRecordRepository) -> FederatedRecordStore {
        FederatedRecordStore::new(Arc::new(relational), Arc::new(key_value)).unwrap()
    }

    #[tokio::test]
    async fn test_create_dispatches_to_selected_backend() {
        let relational = mock(Backend::Relational);
        let mut key_value = mock(Backend::KeyValue);
        key_value
            .expect_create()
            .withf(|_, record| record.backend == Backend::KeyValue && record.name == "Bo")
            .times(1)
            .returning(|_, _| Ok(()));

        let store = store(relational, key_value);
        let created = store
            .create(&CallContext::new(), RecordInput::new("Bo", "b@x.com", "556"), 2)
            .await
            .unwrap();

        assert!(domain::is_record_id(&created.id));
        assert_eq!(created.backend, Backend::KeyValue);
        assert_eq!(created.input(), RecordInput::new("Bo", "b@x.com", "556"));
    }

    #[tokio::test]
    async fn test_create_invalid_selector_writes_nothing() {
        let mut relational = mock(Backend::Relational);
        relational.expect_create().times(0);
        let mut key_value = mock(Backend::KeyValue);
        key_value.expect_create().times(0);

        let store = store(relational, key_value);
        for selector in [0, 3, -1] {
            let err = store
                .create(&CallContext::new(), RecordInput::default(), selector)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidBackend(s) if s == selector));
        }
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_identity() {
        let mut relational = mock(Backend::Relational);
        relational
            .expect_update()
            .withf(|_, record| {
                record.id == "r-1"
                    && record.backend == Backend::Relational
                    && record.input() == RecordInput::new("Annie", "annie@x.com", "777")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let key_value = mock(Backend::KeyValue);

        let store = store(relational, key_value);
        let updated = store
            .update(
                &CallContext::new(),
                "r-1",
                RecordInput::new("Annie", "annie@x.com", "777"),
                1,
            )
            .await
            .unwrap();

        assert_eq!(updated.id, "r-1");
        assert_eq!(updated.backend, Backend::Relational);
    }

    #[tokio::test]
    async fn test_adapter_errors_are_wrapped_not_swallowed() {
        let relational = mock(Backend::Relational);
        let mut key_value = mock(Backend::KeyValue);
        key_value
            .expect_read()
            .with(always(), eq("missing"))
            .returning(|_, id| Err(AppError::not_found(id)));
        key_value
            .expect_delete()
            .returning(|_, _| Err(AppError::unavailable("connection refused")));

        let store = store(relational, key_value);
        let ctx = CallContext::new();

        let err = store.get(&ctx, "missing", 2).await.unwrap_err();
        assert!(matches!(err.root(), AppError::NotFound(id) if id == "missing"));
        assert!(matches!(
            err,
            AppError::Store { backend: Backend::KeyValue, operation: Operation::Read, .. }
        ));

        let err = store.delete(&ctx, "k-1", 2).await.unwrap_err();
        assert!(matches!(err.root(), AppError::BackendUnavailable(_)));
        assert_eq!(err.backend(), Some(Backend::KeyValue));
    }

    #[tokio::test]
    async fn test_list_all_merges_and_sorts_by_id() {
        let mut relational = mock(Backend::Relational);
        relational.expect_list_all().times(1).returning(|_| {
            Ok(vec![
                record("01", "ann", Backend::Relational),
                record("04", "dan", Backend::Relational),
            ])
        });
        let mut key_value = mock(Backend::KeyValue);
        key_value.expect_list_all().times(1).returning(|_| {
            Ok(vec![
                record("03", "cy", Backend::KeyValue),
                record("02", "bo", Backend::KeyValue),
            ])
        });

        let store = store(relational, key_value);
        let ids: Vec<String> = store
            .list_all(&CallContext::new())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec!["01", "02", "03", "04"]);
    }

    #[tokio::test]
    async fn test_list_all_keeps_backend_order_for_equal_ids() {
        let mut relational = mock(Backend::Relational);
        relational
            .expect_list_all()
            .returning(|_| Ok(vec![record("dup", "rel", Backend::Relational)]));
        let mut key_value = mock(Backend::KeyValue);
        key_value
            .expect_list_all()
            .returning(|_| Ok(vec![record("dup", "kv", Backend::KeyValue)]));

        let store = store(relational, key_value).with_strategy(ListStrategy::Concurrent);
        let records = store.list_all(&CallContext::new()).await.unwrap();

        let backends: Vec<Backend> = records.iter().map(|r| r.backend).collect();
        assert_eq!(backends, vec![Backend::Relational, Backend::KeyValue]);
    }

    #[tokio::test]
    async fn test_list_all_empty_backends() {
        let mut relational = mock(Backend::Relational);
        relational.expect_list_all().returning(|_| Ok(vec![]));
        let mut key_value = mock(Backend::KeyValue);
        key_value.expect_list_all().returning(|_| Ok(vec![]));

        let store = store(relational, key_value);
        assert!(store.list_all(&CallContext::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_fails_fast_when_key_value_unreachable() {
        let mut relational = mock(Backend::Relational);
        relational
            .expect_list_all()
            .returning(|_| Ok(vec![record("01", "ann", Backend::Relational)]));
        let mut key_value = mock(Backend::KeyValue);
        key_value
            .expect_list_all()
            .returning(|_| Err(AppError::unavailable("connection refused")));

        let store = store(relational, key_value);
        let err = store.list_all(&CallContext::new()).await.unwrap_err();

        assert!(matches!(err.root(), AppError::BackendUnavailable(_)));
        assert_eq!(err.backend(), Some(Backend::KeyValue));
    }

    #[tokio::test]
    async fn test_sequential_listing_stops_at_first_failure() {
        let mut relational = mock(Backend::Relational);
        relational
            .expect_list_all()
            .returning(|_| Err(AppError::unavailable("timeout")));
        let mut key_value = mock(Backend::KeyValue);
        key_value.expect_list_all().times(0);

        let store = store(relational, key_value);
        let err = store.list_all(&CallContext::new()).await.unwrap_err();

        assert_eq!(err.backend(), Some(Backend::Relational));
    }

    #[tokio::test]
    async fn test_concurrent_listing_fails_fast() {
        let mut relational = mock(Backend::Relational);
        relational
            .expect_list_all()
            .returning(|_| Ok(vec![record("01", "ann", Backend::Relational)]));
        let mut key_value = mock(Backend::KeyValue);
        key_value
            .expect_list_all()
            .returning(|_| Err(AppError::unavailable("connection refused")));

        let store = store(relational, key_value).with_strategy(ListStrategy::Concurrent);
        let err = store.list_all(&CallContext::new()).await.unwrap_err();

        assert!(matches!(err.root(), AppError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_health_reports_every_backend() {
        let mut relational = mock(Backend::Relational);
        relational.expect_ping().returning(|_| Ok(()));
        let mut key_value = mock(Backend::KeyValue);
        key_value
            .expect_ping()
            .returning(|_| Err(AppError::unavailable("down")));

        let store = store(relational, key_value);
        let report = store.health(&CallContext::new()).await;

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].0, Backend::Relational);
        assert!(report[0].1.is_ok());
        assert_eq!(report[1].0, Backend::KeyValue);
        assert!(report[1].1.is_err());
    }

    #[test]
    fn test_new_rejects_adapter_in_wrong_slot() {
        let result = FederatedRecordStore::new(
            Arc::new(mock(Backend::KeyValue)),
            Arc::new(mock(Backend::KeyValue)),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_list_strategy_parsing() {
        assert_eq!("Sequential".parse::<ListStrategy>().unwrap(), ListStrategy::Sequential);
        assert_eq!(" concurrent ".parse::<ListStrategy>().unwrap(), ListStrategy::Concurrent);
        assert!(matches!(
            "parallel".parse::<ListStrategy>(),
            Err(AppError::Configuration(_))
        ));
    }
}
