//! Relational adapter backed by SeaORM.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
    Statement,
};

use super::entities::record::{self, ActiveModel, Entity as RecordEntity};
use super::RecordRepository;
use common::{AppError, AppResult, CallContext};
use domain::{Backend, Record};

/// Relational implementation of RecordRepository.
///
/// `DatabaseConnection` is a pool: each statement checks a connection out and
/// returns it when the statement future completes or is dropped.
pub struct RelationalRepository {
    db: DatabaseConnection,
}

impl RelationalRepository {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_row(&self, record: &Record) -> AppResult<()> {
        RecordEntity::insert(ActiveModel::from(record))
            .exec_without_returning(&self.db)
            .await
            .map_err(|err| match AppError::from(err) {
                AppError::WriteConflict(_) => AppError::write_conflict(&record.id),
                other => other,
            })?;
        Ok(())
    }

    async fn find_row(&self, id: &str) -> AppResult<Record> {
        RecordEntity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
            .map(Record::from)
            .ok_or_else(|| AppError::not_found(id))
    }

    async fn replace_row(&self, record: &Record) -> AppResult<()> {
        // Only existing rows are replaced; never upsert
        let existing = RecordEntity::find_by_id(record.id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(&record.id))?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(record.name.clone());
        active.email = Set(record.email.clone());
        active.phone = Set(record.phone.clone());

        active.update(&self.db).await.map_err(|err| match AppError::from(err) {
            AppError::NotFound(_) => AppError::not_found(&record.id),
            other => other,
        })?;
        Ok(())
    }

    async fn delete_row(&self, id: &str) -> AppResult<()> {
        let result = RecordEntity::delete_by_id(id.to_owned())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            tracing::debug!(id, "relational delete matched no row");
        }
        Ok(())
    }

    async fn scan_rows(&self) -> AppResult<Vec<Record>> {
        let models = RecordEntity::find()
            .order_by_asc(record::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Record::from).collect())
    }

    async fn select_one(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for RelationalRepository {
    fn backend(&self) -> Backend {
        Backend::Relational
    }

    async fn create(&self, ctx: &CallContext, record: &Record) -> AppResult<()> {
        ctx.run(self.insert_row(record)).await
    }

    async fn read(&self, ctx: &CallContext, id: &str) -> AppResult<Record> {
        ctx.run(self.find_row(id)).await
    }

    async fn update(&self, ctx: &CallContext, record: &Record) -> AppResult<()> {
        ctx.run(self.replace_row(record)).await
    }

    async fn delete(&self, ctx: &CallContext, id: &str) -> AppResult<()> {
        ctx.run(self.delete_row(id)).await
    }

    async fn list_all(&self, ctx: &CallContext) -> AppResult<Vec<Record>> {
        ctx.run(self.scan_rows()).await
    }

    async fn ping(&self, ctx: &CallContext) -> AppResult<()> {
        ctx.run(self.select_one()).await
    }
}
