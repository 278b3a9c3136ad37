//! API configuration

use core_kernel::CoreError;
use domain_ledger::LedgerConfig;
use serde::Deserialize;

/// Where the chart, journal, and parties live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local stores seeded with the standard chart
    #[default]
    Memory,
    /// PostgreSQL via `database_url`
    Postgres,
}

/// API configuration
///
/// Every field has a default, so an empty environment yields a working
/// in-memory server on port 8080.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL, used with the postgres backend
    pub database_url: String,
    pub db_max_connections: u32,
    /// Log level
    pub log_level: String,
    pub storage: StorageBackend,
    /// Posting and reporting settings
    #[serde(flatten)]
    pub ledger: LedgerConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/ledger".to_string(),
            db_max_connections: 10,
            log_level: "info".to_string(),
            storage: StorageBackend::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads and validates configuration from `LEDGER_*` environment variables
    pub fn from_env() -> Result<Self, CoreError> {
        let config: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("LEDGER").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the ledger cannot run with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.storage == StorageBackend::Postgres && self.database_url.trim().is_empty() {
            return Err(CoreError::invalid_setting(
                "database_url",
                "postgres storage needs a connection string",
            ));
        }
        if self.storage == StorageBackend::Postgres && self.db_max_connections == 0 {
            return Err(CoreError::invalid_setting(
                "db_max_connections",
                "postgres storage needs at least one connection",
            ));
        }
        if self.ledger.integrity_tolerance.is_sign_negative() {
            return Err(CoreError::invalid_setting(
                "integrity_tolerance",
                "must not be negative",
            ));
        }
        if self.ledger.read_timeout_ms == 0 {
            return Err(CoreError::invalid_setting(
                "read_timeout_ms",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
