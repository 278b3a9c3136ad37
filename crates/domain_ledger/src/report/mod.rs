//! Financial reports
//!
//! Every report is a pure function of a chart snapshot and a `BalanceSet`.
//! Reports never fail on data drift; they carry `DataIntegrityWarning`s
//! instead and reserve errors for structural problems such as a cycle.

pub mod balance_sheet;
pub mod group_tree;
pub mod parties;
pub mod profit_loss;
pub mod trial_balance;

pub use balance_sheet::{balance_sheet_summary, BalanceSheetSummary};
pub use group_tree::{group_balance, group_tree, group_tree_excluding, GroupBalanceNode, LedgerBalanceLine};
pub use parties::{receivables_and_payables, PartyBalanceLine, PartyScope, ReceivablesPayablesReport};
pub use profit_loss::{profit_and_loss, CogsBasis, CogsSource, ProfitAndLossReport};
pub use trial_balance::{trial_balance, TrialBalanceReport, TrialBalanceRow};
