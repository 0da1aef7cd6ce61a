//! Shared configuration structures.
//!
//! Each backend adapter is constructed once at startup from one of these
//! structs. `validate()` rejects missing or malformed fields with
//! [`AppError::Configuration`].

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// HTTP service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Per-request deadline applied to every backend call, in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_ms: 10_000,
        }
    }
}

/// Relational store connection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelationalConfig {
    /// Server address, optionally with port (`db.internal:5432`)
    pub host: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub db_name: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            host: "localhost:5432".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            db_name: "records".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
        }
    }
}

impl RelationalConfig {
    /// Check that every required field is present.
    pub fn validate(&self) -> AppResult<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::configuration("relational host is required"));
        }
        if self.user.trim().is_empty() {
            return Err(AppError::configuration("relational user is required"));
        }
        if self.db_name.trim().is_empty() {
            return Err(AppError::configuration("relational database name is required"));
        }
        if self.host.contains(['/', '@', '?', '#']) {
            return Err(AppError::configuration(format!(
                "relational host '{}' must be a host or host:port",
                self.host
            )));
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(AppError::configuration(
                "relational pool bounds must satisfy 0 < min <= max",
            ));
        }
        Ok(())
    }

    /// Connection URL built from the individual fields.
    pub fn connection_url(&self) -> AppResult<String> {
        self.validate()?;

        let credentials = if self.password.is_empty() {
            encode_userinfo(&self.user)
        } else {
            format!(
                "{}:{}",
                encode_userinfo(&self.user),
                encode_userinfo(&self.password)
            )
        };

        Ok(format!(
            "postgres://{}@{}/{}",
            credentials,
            self.host,
            encode_userinfo(&self.db_name)
        ))
    }
}

/// Key-value store connection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyValueConfig {
    /// Server endpoint URL
    pub endpoint: String,
    /// Deployment region; namespaces every key
    pub region: String,
    /// Logical table holding the record documents
    pub table_name: String,
}

impl Default for KeyValueConfig {
    fn default() -> Self {
        Self {
            endpoint: "redis://127.0.0.1:6379".to_string(),
            region: "local".to_string(),
            table_name: "records".to_string(),
        }
    }
}

impl KeyValueConfig {
    /// Check that every required field is present and well-formed.
    pub fn validate(&self) -> AppResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(AppError::configuration("key-value endpoint is required"));
        }
        if self.region.is_empty() {
            return Err(AppError::configuration("key-value region is required"));
        }
        if !self
            .region
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(AppError::configuration(format!(
                "key-value region '{}' may only contain a-z, 0-9 and '-'",
                self.region
            )));
        }
        let len = self.table_name.len();
        if !(3..=255).contains(&len)
            || !self
                .table_name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
        {
            return Err(AppError::configuration(format!(
                "key-value table name '{}' must be 3-255 characters of [A-Za-z0-9_.-]",
                self.table_name
            )));
        }
        Ok(())
    }

    /// Prefix shared by every key of this table
    pub fn key_prefix(&self) -> String {
        format!("{}:{}:", self.region, self.table_name)
    }
}

/// Percent-encode a URL userinfo or path component.
fn encode_userinfo(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
