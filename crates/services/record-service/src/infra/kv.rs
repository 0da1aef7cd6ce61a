//! Key-value store connection.

use redis::{aio::ConnectionManager, Client};

use common::{AppError, AppResult, KeyValueConfig};

/// Key-value store wrapper with a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct KeyValueStore {
    connection: ConnectionManager,
    config: KeyValueConfig,
}

impl KeyValueStore {
    /// Validate the configuration and connect.
    pub async fn connect(config: &KeyValueConfig) -> AppResult<Self> {
        config.validate()?;

        let client = Client::open(config.endpoint.as_str()).map_err(|e| {
            AppError::configuration(format!("invalid key-value endpoint '{}': {}", config.endpoint, e))
        })?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::unavailable(format!("key-value connect to {}: {}", config.endpoint, e)))?;

        tracing::info!(
            region = %config.region,
            table = %config.table_name,
            "Key-value store connected"
        );

        Ok(Self {
            connection,
            config: config.clone(),
        })
    }

    /// Get the connection manager; clones share one multiplexed connection.
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    pub fn config(&self) -> &KeyValueConfig {
        &self.config
    }
}
