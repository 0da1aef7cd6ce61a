//! Relational database connection.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};

use common::{AppError, AppResult, RelationalConfig};

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Validate the configuration and open the connection pool.
    pub async fn connect(config: &RelationalConfig) -> AppResult<Self> {
        let url = config.connection_url()?;

        let mut options = ConnectOptions::new(url);
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(false);

        let connection = SeaDatabase::connect(options)
            .await
            .map_err(|e| AppError::unavailable(format!("relational connect to {}: {}", config.host, e)))?;
        tracing::info!(host = %config.host, db = %config.db_name, "Relational store connected");

        Ok(Self { connection })
    }

    /// Get a clone of the database connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }
}
