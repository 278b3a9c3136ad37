//! Trial balance

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use core_kernel::{GroupId, LedgerId, Money};

use crate::balance::BalanceSet;
use crate::chart::{ChartOfAccounts, Nature};
use crate::error::{DataIntegrityWarning, LedgerError};

/// One ledger's balance split into columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    pub ledger_id: LedgerId,
    pub ledger_name: String,
    pub group_id: GroupId,
    pub nature: Nature,
    pub debit: Money,
    pub credit: Money,
}

/// Trial balance report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceReport {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Money,
    pub total_credit: Money,
    /// `total_debit - total_credit`
    pub difference: Money,
    /// True when the difference is within tolerance
    pub is_balanced: bool,
    pub warnings: Vec<DataIntegrityWarning>,
}

/// Builds a trial balance from signed balances
///
/// Each non-zero ledger appears once: a positive balance in the debit
/// column, a negative one as its magnitude in the credit column. Rows
/// follow chart order.
pub fn trial_balance(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
    tolerance: Decimal,
) -> Result<TrialBalanceReport, LedgerError> {
    let mut rows = Vec::new();
    let mut total_debit = Money::ZERO;
    let mut total_credit = Money::ZERO;

    for ledger in chart.ledgers() {
        let balance = balances.get(ledger.id);
        if balance.is_zero() {
            continue;
        }

        let debit = balance.positive_part();
        let credit = balance.negative_part();
        total_debit = total_debit.checked_add(&debit)?;
        total_credit = total_credit.checked_add(&credit)?;

        rows.push(TrialBalanceRow {
            ledger_id: ledger.id,
            ledger_name: ledger.name.clone(),
            group_id: ledger.group_id,
            nature: ledger.nature,
            debit,
            credit,
        });
    }

    let difference = total_debit.checked_sub(&total_credit)?;
    let is_balanced = total_debit.approx_eq(&total_credit, tolerance);
    let mut warnings = balances.warnings.clone();

    if !is_balanced {
        warn!(
            total_debit = %total_debit,
            total_credit = %total_credit,
            difference = %difference,
            "Trial balance out of balance"
        );
        warnings.push(DataIntegrityWarning::TrialBalanceMismatch {
            total_debit,
            total_credit,
            difference,
        });
    }

    Ok(TrialBalanceReport {
        rows,
        total_debit,
        total_credit,
        difference,
        is_balanced,
        warnings,
    })
}
