//! Unified error handling for the record stores and the HTTP boundary.
//!
//! Provides a single error type that:
//! - classifies raw backend failures (SQL, key-value) into one taxonomy
//! - carries which backend/operation produced a failure
//! - converts to Axum HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{Backend, DomainError};
use serde::Serialize;
use thiserror::Error;

/// Store operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    ListAll,
    Ping,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::ListAll => "list_all",
            Operation::Ping => "ping",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Routing
    #[error("Invalid backend selector: {0}")]
    InvalidBackend(i32),

    // Resource errors
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    WriteConflict(String),

    // Backend errors
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Caller-initiated aborts
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    // Validation
    #[error("Invalid input: {0}")]
    BadRequest(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),

    /// Error raised by one backend adapter, tagged for diagnosis
    #[error("{backend} {operation} failed: {source}")]
    Store {
        backend: Backend,
        operation: Operation,
        #[source]
        source: Box<AppError>,
    },
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Underlying taxonomy error, with any backend/operation wrapping removed.
    pub fn root(&self) -> &AppError {
        let mut current = self;
        while let AppError::Store { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// Backend that produced this error, if it came from an adapter
    pub fn backend(&self) -> Option<Backend> {
        match self {
            AppError::Store { backend, .. } => Some(*backend),
            _ => None,
        }
    }

    /// Wrap this error with the backend and operation that produced it.
    pub fn in_store(self, backend: Backend, operation: Operation) -> Self {
        AppError::Store {
            backend,
            operation,
            source: Box::new(self),
        }
    }

    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self.root() {
            AppError::InvalidBackend(_) => "INVALID_BACKEND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::WriteConflict(_) => "WRITE_CONFLICT",
            AppError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Cancelled => "CANCELLED",
            AppError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) | AppError::Store { .. } => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self.root() {
            AppError::InvalidBackend(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::WriteConflict(_) => StatusCode::CONFLICT,
            AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            AppError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller is at fault (bad-request class)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.root(),
            AppError::InvalidBackend(_) | AppError::NotFound(_) | AppError::BadRequest(_)
        )
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self.root() {
            // Show full message for client errors
            AppError::InvalidBackend(_) | AppError::NotFound(_) | AppError::BadRequest(_) => {
                self.root().to_string()
            }
            AppError::WriteConflict(_) => "Record already exists".to_string(),

            // Hide details for backend/internal errors
            AppError::BackendUnavailable(detail) => {
                tracing::error!(error = %self, "Backend unavailable: {}", detail);
                match self.backend() {
                    Some(backend) => format!("Backend {} is unavailable", backend),
                    None => "A backend is unavailable".to_string(),
                }
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                "The service is misconfigured".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %self, "Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            other => other.to_string(),
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidBackend(tag) => AppError::InvalidBackend(tag),
        }
    }
}

// =============================================================================
// Backend Error Classification
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::{DbErr, SqlErr};

        let message = err.to_string();
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return AppError::WriteConflict(detail);
        }

        match err {
            DbErr::RecordNotFound(what) => AppError::NotFound(what),
            DbErr::RecordNotUpdated => AppError::NotFound("no row updated".to_string()),
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => AppError::BackendUnavailable(message),
            // Statement failures (missing table, constraint other than
            // uniqueness) are not outages
            _ => AppError::Internal(message),
        }
    }
}

#[cfg(feature = "key-value")]
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
            || err.is_cluster_error()
        {
            AppError::BackendUnavailable(err.to_string())
        } else {
            AppError::Internal(format!("Key-value error: {}", err))
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for attaching store context to results
pub trait StoreResultExt<T> {
    fn in_store(self, backend: Backend, operation: Operation) -> AppResult<T>;
}

impl<T> StoreResultExt<T> for AppResult<T> {
    fn in_store(self, backend: Backend, operation: Operation) -> AppResult<T> {
        self.map_err(|err| err.in_store(backend, operation))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(id: impl Into<String>) -> Self {
        AppError::NotFound(id.into())
    }

    pub fn write_conflict(id: impl Into<String>) -> Self {
        AppError::WriteConflict(id.into())
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        AppError::BackendUnavailable(detail.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::Configuration(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
