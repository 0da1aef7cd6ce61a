//! Route configuration.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{delete_record, get_record, health_check, list_records, save_record};
use super::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/records", get(list_records))
        .route("/records/save", post(save_record))
        .route("/records/delete", post(delete_record))
        .route("/records/:backend/:id", get(get_record))
        .with_state(state)
}
