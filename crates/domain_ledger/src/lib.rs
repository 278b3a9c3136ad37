//! Ledger Domain - General Ledger Engine
//!
//! This crate implements the books of a trading business: a hierarchical
//! chart of accounts, an append-oriented journal of balanced vouchers,
//! balances derived by folding over the journal, and the standard financial
//! reports built from those balances.
//!
//! # Sign Convention
//!
//! A debit is positive and a credit is negative:
//! - Asset and expense ledgers normally carry positive balances
//! - Liability, equity, and income ledgers normally carry negative balances
//! - Across a balanced journal every entry sums to zero
//!
//! # Layers
//!
//! - **chart**: groups, ledgers, natures, canonical roles
//! - **voucher** / **journal**: drafts, validation, committed vouchers
//! - **balance**: the balance fold and account statements
//! - **report**: trial balance, group roll-ups, profit and loss,
//!   receivables and payables, balance-sheet summary
//! - **binder**: idempotent party-to-ledger resolution
//! - **service**: the async facade over the storage ports
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{StandardChart, JournalLog, PostingPolicy, VoucherDraft};
//!
//! let chart = StandardChart::create()?;
//! let mut journal = JournalLog::new();
//!
//! let sale = VoucherDraft::new("Cash sale", date)
//!     .debit(cash, Money::new(dec!(500)))
//!     .credit(sales, Money::new(dec!(500)));
//!
//! journal.append(sale, &chart, &PostingPolicy::open())?;
//! ```

pub mod balance;
pub mod binder;
pub mod chart;
pub mod cogs;
pub mod config;
pub mod error;
pub mod journal;
pub mod ports;
pub mod report;
pub mod service;
pub mod voucher;

pub use balance::{account_statement, AccountStatement, BalanceEngine, BalanceMode, BalanceSet, StatementLine};
pub use binder::PartyLedgerBinder;
pub use chart::{
    CanonicalRole, ChartOfAccounts, DrCr, Group, Ledger, LedgerStatus, LedgerType, Nature,
    OpeningBalance, StandardChart,
};
pub use cogs::{cogs_for_window, cogs_voucher, order_cost, DeliveredOrder, InMemoryOrderBook, OrderLine, OrderPort};
pub use config::LedgerConfig;
pub use error::{DataIntegrityWarning, LedgerError};
pub use journal::{validate_draft, JournalLog, PostingPolicy};
pub use ports::{ChartPort, InMemoryChartStore, InMemoryJournalStore, JournalPort};
pub use report::{
    BalanceSheetSummary, CogsBasis, CogsSource, GroupBalanceNode, LedgerBalanceLine, PartyBalanceLine,
    PartyScope, ProfitAndLossReport, ReceivablesPayablesReport, TrialBalanceReport, TrialBalanceRow,
};
pub use service::LedgerService;
pub use voucher::{Entry, Posting, Voucher, VoucherDraft, VoucherTotals, VoucherType};
