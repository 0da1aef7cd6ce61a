//! Domain layer - Core record entity and identifiers.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! All types here are shared by both store adapters and the federated store.

pub mod constants;
pub mod error;
pub mod id;
pub mod record;

pub use constants::*;
pub use error::DomainError;
pub use id::{is_record_id, new_record_id};
pub use record::{Backend, Record, RecordInput};
