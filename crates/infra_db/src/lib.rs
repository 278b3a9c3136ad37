//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the ledger engine using SQLx. The adapters in
//! [`adapters`] implement the domain ports (`ChartPort`, `JournalPort`,
//! `PartyPort`) so the service layer can run against either the in-memory
//! stores or this crate without change.
//!
//! # Write Serialization
//!
//! Journal and chart writes run inside a transaction holding a
//! transaction-scoped advisory lock, so validation and commit form one
//! critical section even with several API processes sharing a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{PoolSettings, create_pool, run_migrations};
//! use infra_db::adapters::{PostgresChartStore, PostgresJournalStore};
//!
//! let pool = create_pool(PoolSettings::for_url("postgres://localhost/ledger")).await?;
//! run_migrations(&pool).await?;
//! let chart = PostgresChartStore::new(pool.clone());
//! let journal = PostgresJournalStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;

pub use adapters::{PostgresChartStore, PostgresJournalStore, PostgresPartyAdapter};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabasePool, PoolSettings};
