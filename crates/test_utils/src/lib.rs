//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! ledger test suites.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built charts, dates, and parties
//! - `builders`: Builder patterns for vouchers, ledgers, and parties
//! - `database`: Throwaway PostgreSQL containers for adapter tests
//! - `assertions`: Custom assertion helpers for money and reports
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
