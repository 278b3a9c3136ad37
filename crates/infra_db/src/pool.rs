//! Pool setup and schema migrations
//!
//! The ledger opens one pool per process. Posting serializes on an advisory
//! lock, so a handful of connections covers writes and the rest serve
//! report reads.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;

pub type DatabasePool = PgPool;

/// Name reported in `pg_stat_activity` unless overridden
pub const DEFAULT_APPLICATION_NAME: &str = "ledger-api";

/// Pool sizing and connection identity
///
/// ```rust
/// use infra_db::PoolSettings;
///
/// let settings = PoolSettings::for_url("postgres://localhost/ledger")
///     .max_connections(20)
///     .application_name("ledger-reports");
/// assert_eq!(settings.max_connections, 20);
/// ```
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    /// Connections held open while idle, so the first report after a quiet
    /// spell does not pay for a handshake
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub application_name: String,
}

impl PoolSettings {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self.min_connections = self.min_connections.min(max);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    fn connect_options(&self) -> Result<PgConnectOptions, DatabaseError> {
        let options: PgConnectOptions = self
            .url
            .parse()
            .map_err(|e: sqlx::Error| DatabaseError::ConnectionFailed(e.to_string()))?;
        Ok(options.application_name(&self.application_name))
    }
}

/// Opens a pool and checks that the server answers
///
/// # Errors
///
/// `DatabaseError::ConnectionFailed` when the URL does not parse or no
/// connection can be established within the acquire timeout.
pub async fn create_pool(settings: PoolSettings) -> Result<DatabasePool, DatabaseError> {
    let options = settings.connect_options()?;
    info!(
        max_connections = settings.max_connections,
        application_name = %settings.application_name,
        "Opening ledger database pool"
    );

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

/// Applies the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    info!("Applying ledger schema migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
