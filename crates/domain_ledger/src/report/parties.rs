//! Receivables and payables
//!
//! Direction follows the sign of the balance: a debit balance is owed to
//! the business, a credit balance is owed by it. A balance that runs
//! against the ledger's nature is still classified by sign and flagged
//! with an `AbnormalBalance` warning.

use serde::{Deserialize, Serialize};
use tracing::warn;

use core_kernel::{LedgerId, Money};

use crate::balance::BalanceSet;
use crate::chart::{ChartOfAccounts, Ledger, Nature};
use crate::error::{DataIntegrityWarning, LedgerError};

/// Which ledgers the report considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyScope {
    /// Receivable and payable ledgers only
    #[default]
    PartyLedgers,
    /// Every asset and liability ledger
    AllLedgers,
}

impl PartyScope {
    fn includes(&self, ledger: &Ledger) -> bool {
        match self {
            PartyScope::PartyLedgers => ledger.ledger_type.is_party(),
            PartyScope::AllLedgers => matches!(ledger.nature, Nature::Asset | Nature::Liability),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyBalanceLine {
    pub ledger_id: LedgerId,
    pub name: String,
    pub nature: Nature,
    /// Magnitude owed
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivablesPayablesReport {
    pub receivables: Vec<PartyBalanceLine>,
    pub payables: Vec<PartyBalanceLine>,
    pub total_receivable: Money,
    pub total_payable: Money,
    pub warnings: Vec<DataIntegrityWarning>,
}

/// Splits ledger balances into amounts owed to and by the business
pub fn receivables_and_payables(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
    scope: PartyScope,
) -> Result<ReceivablesPayablesReport, LedgerError> {
    let mut report = ReceivablesPayablesReport {
        receivables: Vec::new(),
        payables: Vec::new(),
        total_receivable: Money::ZERO,
        total_payable: Money::ZERO,
        warnings: balances.warnings.clone(),
    };

    for ledger in chart.ledgers().filter(|l| scope.includes(l)) {
        let balance = balances.get(ledger.id);
        if balance.is_zero() {
            continue;
        }

        let line = PartyBalanceLine {
            ledger_id: ledger.id,
            name: ledger.name.clone(),
            nature: ledger.nature,
            amount: balance.abs(),
        };

        let abnormal = if balance.is_positive() {
            report.total_receivable = report.total_receivable.checked_add(&line.amount)?;
            report.receivables.push(line);
            ledger.nature != Nature::Asset
        } else {
            report.total_payable = report.total_payable.checked_add(&line.amount)?;
            report.payables.push(line);
            ledger.nature == Nature::Asset
        };

        if abnormal {
            warn!(
                ledger_id = %ledger.id,
                nature = ledger.nature.code(),
                balance = %balance,
                "Balance runs against ledger nature"
            );
            report.warnings.push(DataIntegrityWarning::AbnormalBalance {
                ledger_id: ledger.id,
                nature: ledger.nature,
                balance,
            });
        }
    }

    Ok(report)
}
