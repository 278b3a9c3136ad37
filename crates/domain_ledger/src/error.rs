//! Ledger domain errors and integrity warnings

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use core_kernel::{
    GroupId, LedgerId, Money, MoneyError, PortError, TemporalError, VoucherId,
};

use crate::chart::Nature;

/// Errors that can occur in the ledger domain
///
/// Validation variants are local and recoverable: the caller corrects the
/// input and retries. `Port` wraps storage failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Voucher debits and credits differ
    #[error("Unbalanced voucher: debits={debits}, credits={credits}")]
    UnbalancedVoucher {
        debits: Money,
        credits: Money,
    },

    /// Voucher has no entries or totals zero
    #[error("Voucher total must be greater than zero")]
    ZeroValueVoucher,

    /// Voucher narration is blank
    #[error("Voucher narration is required")]
    EmptyNarration,

    /// A single entry is malformed
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// Entry references a ledger that does not exist
    #[error("Unknown account: {0}")]
    UnknownAccount(LedgerId),

    /// Group referenced but absent
    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),

    /// Voucher referenced but absent
    #[error("Voucher not found: {0}")]
    VoucherNotFound(VoucherId),

    /// Group ancestry loops back on itself
    #[error("Cycle detected in chart of accounts at group {0}")]
    CycleDetected(GroupId),

    /// Group or ledger id already used
    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    /// Ledger does not accept direct postings
    #[error("Ledger {0} does not accept postings")]
    NonPostingAccount(LedgerId),

    /// Ledger is inactive
    #[error("Ledger {0} is inactive")]
    InactiveAccount(LedgerId),

    /// Voucher date falls inside a closed period
    #[error("Period locked: voucher dated {date} is on or before lock date {lock_date}")]
    PeriodLocked {
        date: NaiveDate,
        lock_date: NaiveDate,
    },

    /// No group is assigned to a canonical role
    #[error("No group assigned to role {0}")]
    RoleNotAssigned(String),

    /// Money arithmetic failed
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Invalid date window
    #[error("Temporal error: {0}")]
    Temporal(#[from] TemporalError),

    /// Storage failure
    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

impl LedgerError {
    /// Returns true for errors caused by caller input rather than storage
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::UnbalancedVoucher { .. }
                | LedgerError::ZeroValueVoucher
                | LedgerError::EmptyNarration
                | LedgerError::InvalidEntry(_)
                | LedgerError::UnknownAccount(_)
                | LedgerError::NonPostingAccount(_)
                | LedgerError::InactiveAccount(_)
                | LedgerError::PeriodLocked { .. }
                | LedgerError::CycleDetected(_)
                | LedgerError::Money(_)
                | LedgerError::Temporal(_)
        )
    }

    /// Returns true for missing-entity errors
    pub fn is_not_found(&self) -> bool {
        match self {
            LedgerError::UnknownGroup(_)
            | LedgerError::VoucherNotFound(_)
            | LedgerError::RoleNotAssigned(_) => true,
            LedgerError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// A non-fatal data-integrity finding
///
/// Warnings are attached to balance results and reports rather than thrown,
/// so historical data that already contains drift stays viewable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIntegrityWarning {
    /// A committed entry references a ledger missing from the chart
    UnknownAccount {
        voucher_id: VoucherId,
        account_id: LedgerId,
    },
    /// Trial balance columns differ beyond tolerance
    TrialBalanceMismatch {
        total_debit: Money,
        total_credit: Money,
        difference: Money,
    },
    /// A party ledger carries a balance against its nature
    AbnormalBalance {
        ledger_id: LedgerId,
        nature: Nature,
        balance: Money,
    },
}
