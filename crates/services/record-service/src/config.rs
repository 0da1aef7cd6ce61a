//! Record service configuration.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use common::{AppError, AppResult, KeyValueConfig, RelationalConfig, ServiceConfig};

use crate::service::ListStrategy;

/// Record service configuration.
#[derive(Debug, Clone, Default)]
pub struct RecordServiceConfig {
    /// HTTP listener and request deadline
    pub service: ServiceConfig,
    /// Relational store connection
    pub relational: RelationalConfig,
    /// Key-value store connection
    pub key_value: KeyValueConfig,
    /// How federated listings scan the backends
    pub list_strategy: ListStrategy,
}

impl RecordServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    ///
    /// Connection fields without a sensible default (host, user, database,
    /// region, table) are left empty when unset so that adapter construction
    /// reports them as missing. A variable that is set but does not parse is
    /// a configuration error, never silently replaced by its default.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_defaults = ServiceConfig::default();
        let relational_defaults = RelationalConfig::default();
        let key_value_defaults = KeyValueConfig::default();

        Ok(Self {
            service: ServiceConfig {
                host: lookup("RECORD_SERVICE_HOST").unwrap_or(service_defaults.host),
                port: parse_var(&lookup, "RECORD_SERVICE_PORT", service_defaults.port)?,
                request_timeout_ms: parse_var(
                    &lookup,
                    "REQUEST_TIMEOUT_MS",
                    service_defaults.request_timeout_ms,
                )?,
            },
            relational: RelationalConfig {
                host: lookup("RELATIONAL_HOST").unwrap_or_default(),
                user: lookup("RELATIONAL_USER").unwrap_or_default(),
                password: lookup("RELATIONAL_PASSWORD").unwrap_or_default(),
                db_name: lookup("RELATIONAL_DBNAME").unwrap_or_default(),
                max_connections: parse_var(
                    &lookup,
                    "RELATIONAL_MAX_CONNECTIONS",
                    relational_defaults.max_connections,
                )?,
                ..relational_defaults
            },
            key_value: KeyValueConfig {
                endpoint: lookup("KV_ENDPOINT").unwrap_or(key_value_defaults.endpoint),
                region: lookup("KV_REGION").unwrap_or_default(),
                table_name: lookup("KV_TABLE_NAME").unwrap_or_default(),
            },
            list_strategy: parse_var(&lookup, "LIST_STRATEGY", ListStrategy::default())?,
        })
    }

    /// Override the listener address where a value is given.
    pub fn with_listener(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.service.host = host;
        }
        if let Some(port) = port {
            self.service.port = port;
        }
        self
    }
}

/// Parse `name` if it is set, otherwise fall back to `default`.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::configuration(format!("{} has invalid value '{}': {}", name, raw, e))
        }),
        None => Ok(default),
    }
}
