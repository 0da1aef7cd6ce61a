//! Record handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::{Deserialize, Serialize};

use common::{AppError, AppResult};
use domain::{Record, RecordInput};

use super::state::AppState;

/// Save form: an empty `id` creates, anything else updates.
#[derive(Debug, Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub backend: String,
}

/// Delete form
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub backend: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backends: Vec<BackendHealth>,
}

/// Individual backend status.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackendHealth {
    pub backend: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse a backend selector. Only the integer shape is checked here; the
/// store decides whether the tag is known.
fn parse_selector(raw: &str) -> AppResult<i32> {
    if raw.trim().is_empty() {
        return Err(AppError::bad_request("backend is required"));
    }
    raw.trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("backend must be an integer, got '{}'", raw)))
}

/// List every record of every backend
pub async fn list_records(State(state): State<AppState>) -> AppResult<Json<Vec<Record>>> {
    let ctx = state.call_context();
    let records = state.records.list_all(&ctx).await?;
    Ok(Json(records))
}

/// Get one record from the given backend
pub async fn get_record(
    State(state): State<AppState>,
    Path((backend, id)): Path<(String, String)>,
) -> AppResult<Json<Record>> {
    let selector = parse_selector(&backend)?;
    let ctx = state.call_context();
    let record = state.records.get(&ctx, &id, selector).await?;
    Ok(Json(record))
}

/// Create or update a record
pub async fn save_record(
    State(state): State<AppState>,
    Form(form): Form<SaveForm>,
) -> AppResult<(StatusCode, Json<Record>)> {
    let selector = parse_selector(&form.backend)?;
    let input = RecordInput::new(form.name, form.email, form.phone);
    let ctx = state.call_context();

    if form.id.is_empty() {
        let record = state.records.create(&ctx, input, selector).await?;
        tracing::info!(id = %record.id, backend = %record.backend, "Record created");
        Ok((StatusCode::CREATED, Json(record)))
    } else {
        let record = state.records.update(&ctx, &form.id, input, selector).await?;
        Ok((StatusCode::OK, Json(record)))
    }
}

/// Delete a record
pub async fn delete_record(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> AppResult<StatusCode> {
    let selector = parse_selector(&form.backend)?;
    if form.id.is_empty() {
        return Err(AppError::bad_request("id is required"));
    }
    let ctx = state.call_context();
    state.records.delete(&ctx, &form.id, selector).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint - pings every backend.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let ctx = state.call_context();
    let report = state.records.health(&ctx).await;

    let healthy = report.iter().all(|(_, status)| status.is_ok());
    let backends = report
        .into_iter()
        .map(|(backend, status)| match status {
            Ok(()) => BackendHealth {
                backend: backend.to_string(),
                status: "healthy".to_string(),
                error: None,
            },
            Err(err) => BackendHealth {
                backend: backend.to_string(),
                status: "unhealthy".to_string(),
                error: Some(err.user_message()),
            },
        })
        .collect();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        backends,
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response)).into_response()
}
