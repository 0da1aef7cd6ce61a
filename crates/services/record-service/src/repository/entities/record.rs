//! Record database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Backend, Record};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Record {
    fn from(model: Model) -> Self {
        Record {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            backend: Backend::Relational,
        }
    }
}

/// Full-row active model; every column is set
impl From<&Record> for ActiveModel {
    fn from(record: &Record) -> Self {
        ActiveModel {
            id: Set(record.id.clone()),
            name: Set(record.name.clone()),
            email: Set(record.email.clone()),
            phone: Set(record.phone.clone()),
        }
    }
}
