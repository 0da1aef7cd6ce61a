//! Common utilities shared by the record service crates.
//!
//! This crate provides:
//! - Unified error taxonomy with HTTP conversion
//! - Backend configuration structures
//! - Call-scoped cancellation and deadlines

pub mod config;
pub mod context;
pub mod error;

pub use config::*;
pub use context::CallContext;
pub use error::{AppError, AppResult, Operation, StoreResultExt};
