//! Balance derivation
//!
//! Balances are a pure fold over the journal: a ledger's signed balance is
//! its signed opening balance (cumulative mode only) plus the signed sum of
//! every entry against it inside the window. Nothing here is stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use core_kernel::{DateWindow, LedgerId, Money, VoucherId};

use crate::chart::ChartOfAccounts;
use crate::error::{DataIntegrityWarning, LedgerError};
use crate::voucher::Voucher;

/// Which slice of history a balance covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BalanceMode {
    /// Opening balance plus every entry up to `as_of`
    Cumulative { as_of: Option<NaiveDate> },
    /// Entries inside the window only, openings excluded
    Movement { window: DateWindow },
}

impl BalanceMode {
    /// Everything ever recorded
    pub fn to_date() -> Self {
        BalanceMode::Cumulative { as_of: None }
    }

    pub fn as_of(date: NaiveDate) -> Self {
        BalanceMode::Cumulative { as_of: Some(date) }
    }

    pub fn movement(window: DateWindow) -> Self {
        BalanceMode::Movement { window }
    }

    /// The journal window this mode reads
    pub fn window(&self) -> DateWindow {
        match self {
            BalanceMode::Cumulative { as_of: Some(date) } => DateWindow::up_to(*date),
            BalanceMode::Cumulative { as_of: None } => DateWindow::unbounded(),
            BalanceMode::Movement { window } => *window,
        }
    }

    pub fn includes_opening(&self) -> bool {
        matches!(self, BalanceMode::Cumulative { .. })
    }
}

/// Signed balances per ledger plus integrity findings
///
/// Ledgers without any activity read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceSet {
    balances: HashMap<LedgerId, Money>,
    pub warnings: Vec<DataIntegrityWarning>,
}

impl BalanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signed balance of a ledger, zero if untouched
    pub fn get(&self, id: LedgerId) -> Money {
        self.balances.get(&id).copied().unwrap_or(Money::ZERO)
    }

    pub fn add(&mut self, id: LedgerId, amount: Money) -> Result<(), LedgerError> {
        let slot = self.balances.entry(id).or_insert(Money::ZERO);
        *slot = slot.checked_add(&amount)?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LedgerId, Money)> + '_ {
        self.balances.iter().map(|(id, m)| (*id, *m))
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of every balance
    pub fn total(&self) -> Result<Money, LedgerError> {
        Ok(Money::checked_sum(self.balances.values().copied())?)
    }

    /// Combines a partial fold into this one
    ///
    /// Folding is associative, so the journal can be read in chunks and the
    /// partial sets merged in any order.
    pub fn merge(&mut self, other: BalanceSet) -> Result<(), LedgerError> {
        for (id, amount) in other.balances {
            self.add(id, amount)?;
        }
        self.warnings.extend(other.warnings);
        Ok(())
    }
}

/// Folds journal entries into balances
pub struct BalanceEngine;

impl BalanceEngine {
    /// Signed opening balances for every ledger in the chart
    pub fn openings(chart: &ChartOfAccounts) -> Result<BalanceSet, LedgerError> {
        let mut set = BalanceSet::new();
        for ledger in chart.ledgers() {
            set.add(ledger.id, ledger.opening_balance.signed())?;
        }
        Ok(set)
    }

    /// Folds the entries of vouchers inside `window`
    ///
    /// Entries against ledgers missing from the chart are skipped and
    /// reported as `UnknownAccount` warnings.
    pub fn fold<'a>(
        chart: &ChartOfAccounts,
        vouchers: impl IntoIterator<Item = &'a Voucher>,
        window: &DateWindow,
    ) -> Result<BalanceSet, LedgerError> {
        let mut set = BalanceSet::new();

        for voucher in vouchers.into_iter().filter(|v| window.contains(v.date)) {
            for entry in &voucher.entries {
                if !chart.contains_ledger(entry.account_id) {
                    warn!(
                        voucher_id = %voucher.id,
                        account_id = %entry.account_id,
                        "Entry references unknown account"
                    );
                    set.warnings.push(DataIntegrityWarning::UnknownAccount {
                        voucher_id: voucher.id,
                        account_id: entry.account_id,
                    });
                    continue;
                }
                set.add(entry.account_id, entry.posting.signed())?;
            }
        }

        Ok(set)
    }

    /// Computes balances for a mode
    pub fn compute<'a>(
        chart: &ChartOfAccounts,
        vouchers: impl IntoIterator<Item = &'a Voucher>,
        mode: BalanceMode,
    ) -> Result<BalanceSet, LedgerError> {
        let mut set = if mode.includes_opening() {
            Self::openings(chart)?
        } else {
            BalanceSet::new()
        };
        set.merge(Self::fold(chart, vouchers, &mode.window())?)?;
        Ok(set)
    }
}

/// One entry on an account statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub voucher_id: VoucherId,
    pub date: NaiveDate,
    pub narration: String,
    pub debit: Money,
    pub credit: Money,
    /// Balance after this line
    pub running_balance: Money,
}

/// Activity on one ledger across a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStatement {
    pub ledger_id: LedgerId,
    pub ledger_name: String,
    pub window: DateWindow,
    /// Opening balance plus everything before the window
    pub opening: Money,
    pub lines: Vec<StatementLine>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub closing: Money,
}

/// Builds a statement for a ledger
///
/// `vouchers` must cover at least everything up to the window's end; lines
/// follow date then insertion order.
pub fn account_statement<'a>(
    chart: &ChartOfAccounts,
    ledger_id: LedgerId,
    vouchers: impl IntoIterator<Item = &'a Voucher>,
    window: &DateWindow,
) -> Result<AccountStatement, LedgerError> {
    let ledger = chart.get_ledger(ledger_id)?;

    let mut ordered: Vec<&Voucher> = vouchers.into_iter().collect();
    ordered.sort_by_key(|v| v.sort_key());

    let mut opening = ledger.opening_balance.signed();
    let mut lines = Vec::new();
    let mut running = Money::ZERO;
    let mut total_debit = Money::ZERO;
    let mut total_credit = Money::ZERO;
    let mut started = false;

    for voucher in ordered {
        if window.to.is_some_and(|to| voucher.date > to) {
            continue;
        }
        let before_window = window.from.is_some_and(|from| voucher.date < from);

        for entry in voucher.entries.iter().filter(|e| e.account_id == ledger_id) {
            if before_window {
                opening = opening.checked_add(&entry.posting.signed())?;
                continue;
            }
            if !started {
                running = opening;
                started = true;
            }
            running = running.checked_add(&entry.posting.signed())?;
            total_debit = total_debit.checked_add(&entry.posting.debit())?;
            total_credit = total_credit.checked_add(&entry.posting.credit())?;
            lines.push(StatementLine {
                voucher_id: voucher.id,
                date: voucher.date,
                narration: voucher.narration.clone(),
                debit: entry.posting.debit(),
                credit: entry.posting.credit(),
                running_balance: running,
            });
        }
    }

    let closing = if started { running } else { opening };

    Ok(AccountStatement {
        ledger_id,
        ledger_name: ledger.name.clone(),
        window: *window,
        opening,
        lines,
        total_debit,
        total_credit,
        closing,
    })
}
