//! Service layer - federated record store.

mod record_service;

pub use record_service::{FederatedRecordStore, ListStrategy, RecordService};
