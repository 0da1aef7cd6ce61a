//! Domain-level errors.
//!
//! These errors represent rule violations detected before any store is
//! touched. They are independent of infrastructure concerns (HTTP, SQL,
//! key-value).

use thiserror::Error;

/// Domain-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Backend selector is not one of the known tags
    #[error("Invalid backend selector: {0}")]
    InvalidBackend(i32),
}
