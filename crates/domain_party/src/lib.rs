//! Party Domain
//!
//! This crate holds the external parties (customers and suppliers) that
//! transact with the business. A party carries an optional weak reference to
//! the chart-of-accounts ledger that records what it owes or is owed.
//!
//! The reference is relation and lookup only: the ledger's lifecycle is
//! independent of the party, and deleting or deactivating a party never
//! touches its ledger.
//!
//! # Examples
//!
//! ```rust
//! use domain_party::{Party, PartyKind};
//!
//! let customer = Party::new("Acme Retail", PartyKind::Customer);
//! assert!(customer.coa_ledger_id.is_none());
//! assert!(customer.kind.is_customer());
//! ```

pub mod party;
pub mod error;
pub mod ports;

pub use party::{Party, PartyKind};
pub use error::PartyError;
pub use ports::{PartyPort, PartyPortExt, InMemoryPartyPort};
