//! Key-value adapter backed by Redis.
//!
//! Each record is one schemaless JSON document stored under
//! `{region}:{table}:{id}`. Conditional `SET` variants give create-if-absent
//! and update-if-present semantics without a read-modify-write cycle.

use async_trait::async_trait;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use super::RecordRepository;
use common::{AppError, AppResult, CallContext, KeyValueConfig};
use domain::{Backend, Record};

/// Keys requested per SCAN round-trip
const SCAN_BATCH_SIZE: usize = 500;

/// Keys fetched per MGET round-trip
const FETCH_BATCH_SIZE: usize = 500;

/// Stored document shape; the owning backend is implied by the store.
#[derive(Debug, Serialize, Deserialize)]
struct RecordDocument {
    id: String,
    name: String,
    email: String,
    phone: String,
}

impl From<&Record> for RecordDocument {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
        }
    }
}

impl From<RecordDocument> for Record {
    fn from(doc: RecordDocument) -> Self {
        Record {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            phone: doc.phone,
            backend: Backend::KeyValue,
        }
    }
}

fn encode(record: &Record) -> AppResult<String> {
    serde_json::to_string(&RecordDocument::from(record))
        .map_err(|e| AppError::internal(format!("Record encoding error: {}", e)))
}

fn decode(key: &str, json: &str) -> AppResult<Record> {
    serde_json::from_str::<RecordDocument>(json)
        .map(Record::from)
        .map_err(|e| AppError::internal(format!("Corrupt document at {}: {}", key, e)))
}

/// Key-value implementation of RecordRepository.
///
/// Production uses the auto-reconnecting [`ConnectionManager`].
#[derive(Clone)]
pub struct KeyValueRepository<C = ConnectionManager> {
    connection: C,
    prefix: String,
}

impl<C> KeyValueRepository<C>
where
    C: ConnectionLike + Clone + Send + Sync,
{
    /// Create new repository instance over an established connection
    pub fn new(connection: C, config: &KeyValueConfig) -> Self {
        Self {
            connection,
            prefix: config.key_prefix(),
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    async fn put_new(&self, record: &Record) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let written: Option<String> = redis::cmd("SET")
            .arg(self.key(&record.id))
            .arg(encode(record)?)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        match written {
            Some(_) => Ok(()),
            None => Err(AppError::write_conflict(&record.id)),
        }
    }

    async fn get_one(&self, id: &str) -> AppResult<Record> {
        let key = self.key(id);
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(&key).await?;

        match value {
            Some(json) => decode(&key, &json),
            None => Err(AppError::not_found(id)),
        }
    }

    async fn put_existing(&self, record: &Record) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let written: Option<String> = redis::cmd("SET")
            .arg(self.key(&record.id))
            .arg(encode(record)?)
            .arg("XX")
            .query_async(&mut conn)
            .await?;

        match written {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(&record.id)),
        }
    }

    async fn remove(&self, id: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let removed: i64 = conn.del(self.key(id)).await?;

        if removed == 0 {
            tracing::debug!(id, "key-value delete matched no key");
        }
        Ok(())
    }

    /// Every key of this table. SCAN may repeat keys, so the result is
    /// sorted and deduplicated.
    async fn scan_keys(&self) -> AppResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", self.prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn scan_all(&self) -> AppResult<Vec<Record>> {
        let keys = self.scan_keys().await?;
        let mut records = Vec::with_capacity(keys.len());
        let mut conn = self.connection.clone();

        for chunk in keys.chunks(FETCH_BATCH_SIZE) {
            let values: Vec<Option<String>> = redis::cmd("MGET")
                .arg(chunk)
                .query_async(&mut conn)
                .await?;

            // Keys deleted between SCAN and MGET come back as nil
            for (key, value) in chunk.iter().zip(values) {
                if let Some(json) = value {
                    records.push(decode(key, &json)?);
                }
            }
        }

        Ok(records)
    }

    async fn round_trip(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl<C> RecordRepository for KeyValueRepository<C>
where
    C: ConnectionLike + Clone + Send + Sync,
{
    fn backend(&self) -> Backend {
        Backend::KeyValue
    }

    async fn create(&self, ctx: &CallContext, record: &Record) -> AppResult<()> {
        ctx.run(self.put_new(record)).await
    }

    async fn read(&self, ctx: &CallContext, id: &str) -> AppResult<Record> {
        ctx.run(self.get_one(id)).await
    }

    async fn update(&self, ctx: &CallContext, record: &Record) -> AppResult<()> {
        ctx.run(self.put_existing(record)).await
    }

    async fn delete(&self, ctx: &CallContext, id: &str) -> AppResult<()> {
        ctx.run(self.remove(id)).await
    }

    async fn list_all(&self, ctx: &CallContext) -> AppResult<Vec<Record>> {
        ctx.run(self.scan_all()).await
    }

    async fn ping(&self, ctx: &CallContext) -> AppResult<()> {
        ctx.run(self.round_trip()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::RecordInput;
    use redis::{ErrorKind, RedisError, Value};
    use redis_test::{MockCmd, MockRedisConnection};

    const PREFIX: &str = "local:records:";

    fn record(id: &str, name: &str) -> Record {
        Record::new(
            id.to_string(),
            RecordInput::new(name, format!("{}@x.com", name), "556"),
            Backend::KeyValue,
        )
    }

    fn repo(commands: Vec<MockCmd>) -> KeyValueRepository<MockRedisConnection> {
        KeyValueRepository::new(MockRedisConnection::new(commands), &KeyValueConfig::default())
    }

    fn key(id: &str) -> String {
        format!("{}{}", PREFIX, id)
    }

    fn set(record: &Record, condition: &str) -> redis::Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key(&record.id))
            .arg(encode(record).unwrap())
            .arg(condition);
        cmd
    }

    fn scan(cursor: u64) -> redis::Cmd {
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(cursor)
            .arg("MATCH")
            .arg(format!("{}*", PREFIX))
            .arg("COUNT")
            .arg(SCAN_BATCH_SIZE);
        cmd
    }

    fn bulk(s: &str) -> Value {
        Value::BulkString(s.as_bytes().to_vec())
    }

    #[test]
    fn test_document_omits_backend() {
        let record = Record::new(
            "0190a3e2-0000-7000-8000-000000000001".to_string(),
            RecordInput::new("Bo", "b@x.com", "556"),
            Backend::KeyValue,
        );
        let json = encode(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "Bo");
        assert!(value.get("backend").is_none());
    }

    #[test]
    fn test_decode_tags_record_as_key_value() {
        let json = r#"{"id":"abc","name":"Bo","email":"b@x.com","phone":"556"}"#;
        let record = decode("local:records:abc", json).unwrap();

        assert_eq!(record.backend, Backend::KeyValue);
        assert_eq!(record.phone, "556");
    }

    #[test]
    fn test_decode_rejects_corrupt_document() {
        let err = decode("local:records:abc", "{\"id\":1}").unwrap_err();
        assert!(matches!(err, AppError::Internal(msg) if msg.contains("local:records:abc")));
    }

    #[tokio::test]
    async fn test_create_is_set_if_absent() {
        let bo = record("k-1", "bo");
        let repo = repo(vec![
            MockCmd::new(set(&bo, "NX"), Ok(Value::Okay)),
            MockCmd::new(set(&bo, "NX"), Ok(Value::Nil)),
        ]);
        let ctx = CallContext::new();

        repo.create(&ctx, &bo).await.unwrap();
        let err = repo.create(&ctx, &bo).await.unwrap_err();

        assert!(matches!(err, AppError::WriteConflict(id) if id == "k-1"));
    }

    #[tokio::test]
    async fn test_update_is_set_if_present() {
        let bo = record("k-1", "bo");
        let repo = repo(vec![
            MockCmd::new(set(&bo, "XX"), Ok(Value::Nil)),
            MockCmd::new(set(&bo, "XX"), Ok(Value::Okay)),
        ]);
        let ctx = CallContext::new();

        // Absent key: no upsert
        let err = repo.update(&ctx, &bo).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(id) if id == "k-1"));

        repo.update(&ctx, &bo).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_key_is_not_found() {
        let bo = record("k-1", "bo");
        let repo = repo(vec![
            MockCmd::new(redis::cmd("GET").arg(key("nope")), Ok(Value::Nil)),
            MockCmd::new(redis::cmd("GET").arg(key("k-1")), Ok(bulk(&encode(&bo).unwrap()))),
        ]);
        let ctx = CallContext::new();

        assert!(matches!(repo.read(&ctx, "nope").await, Err(AppError::NotFound(_))));
        assert_eq!(repo.read(&ctx, "k-1").await.unwrap(), bo);
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_key() {
        let repo = repo(vec![
            MockCmd::new(redis::cmd("DEL").arg(key("k-1")), Ok(1i64)),
            MockCmd::new(redis::cmd("DEL").arg(key("k-1")), Ok(0i64)),
        ]);
        let ctx = CallContext::new();

        repo.delete(&ctx, "k-1").await.unwrap();
        repo.delete(&ctx, "k-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_all_follows_cursor_and_skips_vanished_keys() {
        let (a, b, c) = (record("k-1", "a"), record("k-2", "b"), record("k-3", "c"));
        let repo = repo(vec![
            MockCmd::new(
                scan(0),
                Ok(Value::Array(vec![
                    bulk("17"),
                    Value::Array(vec![bulk(&key("k-2")), bulk(&key("k-1"))]),
                ])),
            ),
            // SCAN may hand back a key it already returned
            MockCmd::new(
                scan(17),
                Ok(Value::Array(vec![
                    bulk("0"),
                    Value::Array(vec![bulk(&key("k-1")), bulk(&key("k-3"))]),
                ])),
            ),
            MockCmd::new(
                redis::cmd("MGET").arg(vec![key("k-1"), key("k-2"), key("k-3")]),
                Ok(Value::Array(vec![
                    bulk(&encode(&a).unwrap()),
                    Value::Nil,
                    bulk(&encode(&c).unwrap()),
                ])),
            ),
        ]);

        let records = repo.list_all(&CallContext::new()).await.unwrap();

        assert_eq!(records, vec![a, c]);
        assert!(!records.contains(&b));
    }

    #[tokio::test]
    async fn test_list_all_empty_table_skips_fetch() {
        let repo = repo(vec![MockCmd::new(
            scan(0),
            Ok(Value::Array(vec![bulk("0"), Value::Array(vec![])])),
        )]);

        assert!(repo.list_all(&CallContext::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_io_failure_is_unavailable() {
        let repo = repo(vec![MockCmd::new::<_, Value>(
            redis::cmd("GET").arg(key("k-1")),
            Err(RedisError::from((ErrorKind::IoError, "broken pipe"))),
        )]);

        let err = repo.read(&CallContext::new(), "k-1").await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cancelled_context_sends_nothing() {
        // No scripted commands: any request would fail as unexpected
        let repo = repo(vec![]);
        let ctx = CallContext::new();
        ctx.cancel();

        let err = repo.create(&ctx, &record("k-1", "bo")).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
    }

    #[tokio::test]
    async fn test_ping() {
        let repo = repo(vec![MockCmd::new(
            redis::cmd("PING"),
            Ok(Value::SimpleString("PONG".to_string())),
        )]);

        repo.ping(&CallContext::new()).await.unwrap();
    }
}
