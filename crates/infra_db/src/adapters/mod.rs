//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and row types
//! - Maps database failures into the port's error space
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresChartStore;
//! use domain_ledger::ChartPort;
//!
//! let chart = PostgresChartStore::new(pool);
//! let snapshot = chart.snapshot().await?;
//! ```

pub mod chart;
pub mod journal;
pub mod party;

pub use chart::PostgresChartStore;
pub use journal::PostgresJournalStore;
pub use party::PostgresPartyAdapter;

use chrono::Utc;
use core_kernel::{AdapterHealth, HealthCheckResult};
use sqlx::{PgConnection, PgPool};

/// Advisory lock key serializing chart mutations
pub(crate) const CHART_LOCK_KEY: i64 = 0x4c45_4447_0001;

/// Advisory lock key serializing journal writes
pub(crate) const JOURNAL_LOCK_KEY: i64 = 0x4c45_4447_0002;

/// Takes a transaction-scoped advisory lock, released on commit or rollback
pub(crate) async fn lock_xact(conn: &mut PgConnection, key: i64) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

/// Runs `SELECT 1` and reports latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };

    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}
