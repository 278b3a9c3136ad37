//! HTTP API Layer
//!
//! REST front for the ledger engine using Axum. Posting and every report
//! run through `LedgerService`; party ledgers are resolved by
//! `PartyLedgerBinder`.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers per resource
//! - **Middleware**: tracing and audit logging
//! - **DTOs**: request and query bodies
//! - **Error Handling**: ledger and port errors mapped to status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::in_memory(config, StandardChart::create()?);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_ledger::{
    ChartOfAccounts, ChartPort, InMemoryChartStore, InMemoryJournalStore, JournalPort,
    LedgerService, PartyLedgerBinder,
};
use domain_party::{InMemoryPartyPort, PartyPort};
use infra_db::{DatabasePool, PostgresChartStore, PostgresJournalStore, PostgresPartyAdapter};

use crate::config::ApiConfig;
use crate::handlers::{chart, health, party, report, voucher};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService>,
    pub binder: Arc<PartyLedgerBinder>,
    pub parties: Arc<dyn PartyPort>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the service and binder over one set of stores
    pub fn new(
        config: ApiConfig,
        chart: Arc<dyn ChartPort>,
        journal: Arc<dyn JournalPort>,
        parties: Arc<dyn PartyPort>,
    ) -> Self {
        let service = LedgerService::new(chart.clone(), journal, config.ledger.clone());
        let binder = PartyLedgerBinder::new(chart, parties.clone())
            .with_max_attempts(config.ledger.bind_attempts);
        Self {
            service: Arc::new(service),
            binder: Arc::new(binder),
            parties,
            config,
        }
    }

    /// Process-local stores starting from `chart`
    pub fn in_memory(config: ApiConfig, chart: ChartOfAccounts) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryChartStore::new(chart)),
            Arc::new(InMemoryJournalStore::new()),
            Arc::new(InMemoryPartyPort::new()),
        )
    }

    /// PostgreSQL-backed stores sharing one pool
    pub fn postgres(config: ApiConfig, pool: DatabasePool) -> Self {
        Self::new(
            config,
            Arc::new(PostgresChartStore::new(pool.clone())),
            Arc::new(PostgresJournalStore::new(pool.clone())),
            Arc::new(PostgresPartyAdapter::new(pool)),
        )
    }
}

/// Creates the main API router
///
/// Health routes sit at the root; everything else lives under `/api/v1`
/// behind the audit middleware. Every request carries an `x-request-id`,
/// generated when the caller sends none and echoed on the response.
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Chart routes
    let group_routes = Router::new()
        .route("/", get(chart::list_groups).post(chart::create_group))
        .route("/:id/parent", put(chart::move_group))
        .route("/:id/tree", get(report::group_tree));

    let ledger_routes = Router::new()
        .route("/", get(chart::list_ledgers).post(chart::create_ledger))
        .route("/:id", get(chart::get_ledger))
        .route("/:id/statement", get(chart::ledger_statement));

    // Journal routes
    let voucher_routes = Router::new()
        .route("/", get(voucher::list_vouchers).post(voucher::post_voucher))
        .route(
            "/:id",
            get(voucher::get_voucher)
                .put(voucher::replace_voucher)
                .delete(voucher::delete_voucher),
        )
        .route("/:id/reverse", post(voucher::reverse_voucher));

    // Report routes
    let report_routes = Router::new()
        .route("/trial-balance", get(report::trial_balance))
        .route("/profit-and-loss", get(report::profit_and_loss))
        .route("/receivables-payables", get(report::receivables_payables))
        .route("/balance-sheet", get(report::balance_sheet))
        .route("/balances", get(report::balances));

    // Party routes
    let party_routes = Router::new()
        .route("/", get(party::list_parties).post(party::create_party))
        .route("/:id", get(party::get_party))
        .route("/:id/ledger", post(party::resolve_party_ledger));

    let api_routes = Router::new()
        .nest("/groups", group_routes)
        .nest("/ledgers", ledger_routes)
        .nest("/vouchers", voucher_routes)
        .nest("/reports", report_routes)
        .nest("/parties", party_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        // outermost first: the id is set before tracing sees the request
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        // CORS stays outermost; a separate layer call lets axum box the body
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
