//! Ledger API Server Binary
//!
//! Starts the HTTP API for the ledger engine.
//!
//! # Usage
//!
//! ```bash
//! # In-memory books seeded with the standard chart
//! cargo run --bin ledger-api
//!
//! # PostgreSQL storage
//! LEDGER_STORAGE=postgres LEDGER_DATABASE_URL=postgres://... cargo run --bin ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `LEDGER_HOST` - Server host (default: 0.0.0.0)
//! * `LEDGER_PORT` - Server port (default: 8080)
//! * `LEDGER_STORAGE` - `memory` or `postgres` (default: memory)
//! * `LEDGER_DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `LEDGER_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `LEDGER_LOCK_DATE` - Closed-period boundary, inclusive
//! * `LEDGER_COGS_BASIS` - `orders` or `ledger`
//! * `LEDGER_PARTY_SCOPE` - `party_ledgers` or `all_ledgers`
//! * `LEDGER_READ_TIMEOUT_MS` - Report read deadline
//! * `LEDGER_INTEGRITY_TOLERANCE` - Trial balance tolerance
//! * `LEDGER_BIND_ATTEMPTS` - Party binding retries (default: 5)

use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_ledger::StandardChart;
use infra_db::{create_pool, run_migrations, PoolSettings, PostgresChartStore};
use interface_api::config::{ApiConfig, StorageBackend};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid LEDGER_* configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        "Starting ledger API server"
    );

    let state = build_state(config.clone()).await?;
    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Opens the configured storage and seeds the standard chart into it
async fn build_state(config: ApiConfig) -> anyhow::Result<AppState> {
    let chart = StandardChart::create()?;

    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, books are lost on exit");
            Ok(AppState::in_memory(config, chart))
        }
        StorageBackend::Postgres => {
            let settings = PoolSettings::for_url(&config.database_url)
                .max_connections(config.db_max_connections);
            let pool = create_pool(settings)
                .await
                .context("connecting to database")?;
            run_migrations(&pool).await?;

            if PostgresChartStore::new(pool.clone()).seed(&chart).await? {
                tracing::info!("Seeded empty database with the standard chart");
            }
            Ok(AppState::postgres(config, pool))
        }
    }
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
