//! Repository layer: one adapter per physical store.

pub mod entities;
mod key_value;
mod record_repository;
mod relational;

pub use key_value::KeyValueRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use record_repository::MockRecordRepository;
pub use record_repository::RecordRepository;
pub use relational::RelationalRepository;
