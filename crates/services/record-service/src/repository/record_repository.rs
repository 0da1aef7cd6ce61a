//! Backend adapter contract shared by every store.

use async_trait::async_trait;

use common::{AppResult, CallContext};
use domain::{Backend, Record};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Record repository trait implemented once per physical store.
///
/// Every call runs under the caller's [`CallContext`] and checks out its own
/// connection for the duration of that call only.
///
/// Policies shared by all implementations:
/// - `update` never inserts; a missing id is `NotFound`
/// - `delete` of a missing id succeeds
/// - `list_all` on an empty store returns an empty vec
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Store this adapter talks to
    fn backend(&self) -> Backend;

    /// Persist a new record (id already assigned)
    async fn create(&self, ctx: &CallContext, record: &Record) -> AppResult<()>;

    /// Fetch a record by id
    async fn read(&self, ctx: &CallContext, id: &str) -> AppResult<Record>;

    /// Replace name, email and phone of an existing record
    async fn update(&self, ctx: &CallContext, record: &Record) -> AppResult<()>;

    /// Remove a record
    async fn delete(&self, ctx: &CallContext, id: &str) -> AppResult<()>;

    /// Full scan of the store
    async fn list_all(&self, ctx: &CallContext) -> AppResult<Vec<Record>>;

    /// Round-trip to the store without touching records
    async fn ping(&self, ctx: &CallContext) -> AppResult<()>;
}
