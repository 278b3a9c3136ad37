//! Balance-sheet summary and net worth

use serde::Serialize;

use core_kernel::Money;

use crate::balance::BalanceSet;
use crate::chart::{ChartOfAccounts, Nature};
use crate::error::{DataIntegrityWarning, LedgerError};
use crate::report::group_tree::group_balance;

/// Headline balance-sheet figures
///
/// Liabilities, equity, and earnings are shown with credit balances as
/// positive numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheetSummary {
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_equity: Money,
    /// Income less expenses not yet closed to equity
    pub current_earnings: Money,
    /// `total_assets - total_liabilities`
    pub net_worth: Money,
    pub warnings: Vec<DataIntegrityWarning>,
}

/// Rolls each root group up by nature
pub fn balance_sheet_summary(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
) -> Result<BalanceSheetSummary, LedgerError> {
    let mut assets = Money::ZERO;
    let mut liabilities = Money::ZERO;
    let mut equity = Money::ZERO;
    let mut nominal = Money::ZERO;

    for root in chart.root_groups() {
        let total = group_balance(chart, balances, root.id)?;
        let slot = match root.nature {
            Nature::Asset => &mut assets,
            Nature::Liability => &mut liabilities,
            Nature::Equity => &mut equity,
            Nature::Income | Nature::Expense => &mut nominal,
        };
        *slot = slot.checked_add(&total)?;
    }

    let total_liabilities = -liabilities;
    Ok(BalanceSheetSummary {
        total_assets: assets,
        total_liabilities,
        total_equity: -equity,
        current_earnings: -nominal,
        net_worth: assets.checked_sub(&total_liabilities)?,
        warnings: balances.warnings.clone(),
    })
}
