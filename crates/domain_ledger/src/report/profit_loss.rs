//! Profit and loss statement
//!
//! Income is credit-heavy, so its roll-up is negative and presented negated.
//! Expenses are debit-heavy and presented as rolled up. Both totals keep
//! their sign, so a credit-heavy expense group reduces expenses instead of
//! inflating them.

use serde::{Deserialize, Serialize};

use core_kernel::{DateWindow, Money};

use crate::balance::BalanceSet;
use crate::chart::{CanonicalRole, ChartOfAccounts, Nature};
use crate::error::{DataIntegrityWarning, LedgerError};
use crate::report::group_tree::{group_tree_excluding, GroupBalanceNode};

/// Where cost of goods sold comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CogsBasis {
    /// Quantities on delivered orders times product unit cost
    #[default]
    Orders,
    /// The roll-up of the cost-of-goods-sold group
    Ledger,
}

/// A resolved cost-of-goods-sold input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CogsSource {
    /// Figure computed from delivered orders
    FromOrders(Money),
    /// Use the cost-of-goods-sold group balance
    FromLedger,
}

impl CogsSource {
    pub fn basis(&self) -> CogsBasis {
        match self {
            CogsSource::FromOrders(_) => CogsBasis::Orders,
            CogsSource::FromLedger => CogsBasis::Ledger,
        }
    }
}

/// Profit and loss for a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitAndLossReport {
    pub window: DateWindow,
    pub income: Vec<GroupBalanceNode>,
    /// Expense trees with the cost-of-goods-sold group left out
    pub expenses: Vec<GroupBalanceNode>,
    pub total_income: Money,
    pub total_expenses: Money,
    pub cost_of_goods_sold: Money,
    pub cogs_basis: CogsBasis,
    /// `total_income - cost_of_goods_sold`
    pub gross_profit: Money,
    /// `total_income - total_expenses - cost_of_goods_sold`
    pub net_profit: Money,
    pub warnings: Vec<DataIntegrityWarning>,
}

/// Builds a profit and loss statement from movement balances
///
/// Root groups are partitioned by nature. The group assigned to
/// `CostOfGoodsSold` is excluded from the expense trees whichever basis is
/// used, so cost is never counted twice.
pub fn profit_and_loss(
    chart: &ChartOfAccounts,
    balances: &BalanceSet,
    window: DateWindow,
    cogs: CogsSource,
) -> Result<ProfitAndLossReport, LedgerError> {
    let cogs_group = chart.role_of(CanonicalRole::CostOfGoodsSold);
    let excluded: Vec<_> = cogs_group.into_iter().collect();

    let mut income = Vec::new();
    let mut expenses = Vec::new();
    for root in chart.root_groups() {
        match root.nature {
            Nature::Income => income.push(group_tree_excluding(chart, balances, root.id, &excluded)?),
            Nature::Expense => expenses.push(group_tree_excluding(chart, balances, root.id, &excluded)?),
            _ => {}
        }
    }

    let total_income = -Money::checked_sum(income.iter().map(|n| n.total))?;
    let total_expenses = Money::checked_sum(expenses.iter().map(|n| n.total))?;

    let cost_of_goods_sold = match cogs {
        CogsSource::FromOrders(amount) => amount,
        CogsSource::FromLedger => match cogs_group {
            Some(id) => group_tree_excluding(chart, balances, id, &[])?.total,
            None => Money::ZERO,
        },
    };

    let gross_profit = total_income.checked_sub(&cost_of_goods_sold)?;
    let net_profit = gross_profit.checked_sub(&total_expenses)?;

    Ok(ProfitAndLossReport {
        window,
        income,
        expenses,
        total_income,
        total_expenses,
        cost_of_goods_sold,
        cogs_basis: cogs.basis(),
        gross_profit,
        net_profit,
        warnings: balances.warnings.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::StandardChart;
    use rust_decimal_macros::dec;

    fn ledger(chart: &ChartOfAccounts, name: &str) -> core_kernel::LedgerId {
        chart.find_by_name(name).unwrap().id
    }

    #[test]
    fn test_net_profit_with_order_cogs() {
        let chart = StandardChart::create().unwrap();
        let mut balances = BalanceSet::new();
        balances.add(ledger(&chart, "Sales"), Money::new(dec!(-1000))).unwrap();
        balances.add(ledger(&chart, "Rent"), Money::new(dec!(200))).unwrap();
        // ledger-side cost must not leak into expenses
        balances.add(ledger(&chart, "Cost of Goods Sold"), Money::new(dec!(999))).unwrap();

        let report = profit_and_loss(
            &chart,
            &balances,
            DateWindow::unbounded(),
            CogsSource::FromOrders(Money::new(dec!(300))),
        )
        .unwrap();

        assert_eq!(report.total_income, Money::new(dec!(1000)));
        assert_eq!(report.total_expenses, Money::new(dec!(200)));
        assert_eq!(report.cost_of_goods_sold, Money::new(dec!(300)));
        assert_eq!(report.gross_profit, Money::new(dec!(700)));
        assert_eq!(report.net_profit, Money::new(dec!(500)));
        assert_eq!(report.cogs_basis, CogsBasis::Orders);
    }

    #[test]
    fn test_ledger_basis_uses_cogs_group() {
        let chart = StandardChart::create().unwrap();
        let mut balances = BalanceSet::new();
        balances.add(ledger(&chart, "Sales"), Money::new(dec!(-1000))).unwrap();
        balances.add(ledger(&chart, "Cost of Goods Sold"), Money::new(dec!(400))).unwrap();

        let report =
            profit_and_loss(&chart, &balances, DateWindow::unbounded(), CogsSource::FromLedger).unwrap();
        assert_eq!(report.cost_of_goods_sold, Money::new(dec!(400)));
        assert!(report.total_expenses.is_zero());
        assert_eq!(report.net_profit, Money::new(dec!(600)));
    }

    #[test]
    fn test_empty_period_is_all_zero() {
        let chart = StandardChart::create().unwrap();
        let report = profit_and_loss(
            &chart,
            &BalanceSet::new(),
            DateWindow::unbounded(),
            CogsSource::FromOrders(Money::ZERO),
        )
        .unwrap();
        assert!(report.net_profit.is_zero());
        assert_eq!(report.income.len(), 1);
        assert_eq!(report.expenses.len(), 1);
    }
}
