//! Record Service Library
//!
//! This crate stores records across a relational store and a key-value store
//! and serves them over HTTP as one federated collection.

pub mod config;
pub mod http;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing::{error, info};

use common::{AppResult, CallContext};

use crate::config::RecordServiceConfig;
use crate::http::{create_router, AppState};
use crate::infra::{Database, KeyValueStore};
use crate::repository::{KeyValueRepository, RelationalRepository};
use crate::service::{FederatedRecordStore, RecordService};

/// Connect both stores and build the federated store over them.
pub async fn build_store(config: &RecordServiceConfig) -> AppResult<FederatedRecordStore> {
    let db = Database::connect(&config.relational).await?;
    let kv = KeyValueStore::connect(&config.key_value).await?;

    let relational = Arc::new(RelationalRepository::new(db.get_connection()));
    let key_value = Arc::new(KeyValueRepository::new(kv.connection(), kv.config()));

    Ok(FederatedRecordStore::new(relational, key_value)?.with_strategy(config.list_strategy))
}

/// Run the HTTP server with configuration from the environment. `host` and
/// `port` override the configured listener address when given.
pub async fn run_embedded(
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = RecordServiceConfig::from_env()?.with_listener(host, port);
    run_server_with_config(config).await
}

/// Connect both stores and ping them once.
///
/// Returns `true` only if every backend answered.
pub async fn check_backends() -> Result<bool, Box<dyn std::error::Error>> {
    let config = RecordServiceConfig::from_env()?;
    let store = build_store(&config).await?;
    let ctx = CallContext::new()
        .with_timeout(Duration::from_millis(config.service.request_timeout_ms));

    let mut healthy = true;
    for (backend, status) in store.health(&ctx).await {
        match status {
            Ok(()) => info!(%backend, "Backend reachable"),
            Err(e) => {
                error!(%backend, error = %e, "Backend unreachable");
                healthy = false;
            }
        }
    }

    Ok(healthy)
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(config: RecordServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Connect stores and build the federated store
    let store = Arc::new(build_store(&config).await?);
    info!(strategy = ?store.strategy(), "Federated record store ready");

    // Create app state
    let timeout = Duration::from_millis(config.service.request_timeout_ms);
    let state = AppState::new(store, timeout);

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Build address
    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;
    info!("Record service listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
