//! Database entities for SeaORM.

pub mod record;
