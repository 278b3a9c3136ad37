//! Append-oriented journal of vouchers
//!
//! The journal is the single source of truth; balances are derived by
//! folding over it and are never stored. Every write validates the voucher
//! against the chart as one step with the commit, so a rejected voucher
//! leaves the journal untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use core_kernel::{DateWindow, VoucherId};

use crate::chart::ChartOfAccounts;
use crate::error::LedgerError;
use crate::voucher::{Voucher, VoucherDraft, VoucherTotals};

/// Rules applied to every journal write beyond voucher shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostingPolicy {
    /// Vouchers dated on or before this date cannot be written
    pub lock_date: Option<NaiveDate>,
}

impl PostingPolicy {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn locked_through(date: NaiveDate) -> Self {
        Self { lock_date: Some(date) }
    }

    /// # Errors
    ///
    /// `PeriodLocked` if `date` falls in the closed period
    pub fn check_date(&self, date: NaiveDate) -> Result<(), LedgerError> {
        match self.lock_date {
            Some(lock_date) if date <= lock_date => Err(LedgerError::PeriodLocked { date, lock_date }),
            _ => Ok(()),
        }
    }
}

/// Validates a draft against the chart and policy
///
/// Shape checks come first, then each entry's account must exist, accept
/// postings, and be active.
pub fn validate_draft(
    draft: &VoucherDraft,
    chart: &ChartOfAccounts,
    policy: &PostingPolicy,
) -> Result<VoucherTotals, LedgerError> {
    let totals = draft.check_shape()?;

    for entry in &draft.entries {
        let ledger = chart.get_ledger(entry.account_id)?;
        if !ledger.is_posting {
            return Err(LedgerError::NonPostingAccount(ledger.id));
        }
        if !ledger.is_active() {
            return Err(LedgerError::InactiveAccount(ledger.id));
        }
    }

    policy.check_date(draft.date)?;
    Ok(totals)
}

/// An in-memory journal
///
/// Sequence numbers increase monotonically and are never reused, so
/// `list_in_range` is stable across calls.
#[derive(Debug, Default)]
pub struct JournalLog {
    vouchers: HashMap<VoucherId, Voucher>,
    next_sequence: u64,
}

impl JournalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and commits a new voucher
    pub fn append(
        &mut self,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        let totals = validate_draft(&draft, chart, policy)?;

        self.next_sequence += 1;
        let voucher = Voucher::from_draft(VoucherId::new(), self.next_sequence, draft);
        info!(
            voucher_id = %voucher.id,
            date = %voucher.date,
            total = %totals.debits,
            "Voucher appended"
        );

        self.vouchers.insert(voucher.id, voucher.clone());
        Ok(voucher)
    }

    /// Replaces a voucher's content atomically
    ///
    /// The voucher keeps its id and insertion order. Both the old and the
    /// new date must lie outside any locked period.
    pub fn replace(
        &mut self,
        id: VoucherId,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        let existing = self.vouchers.get(&id).ok_or(LedgerError::VoucherNotFound(id))?;
        policy.check_date(existing.date)?;
        validate_draft(&draft, chart, policy)?;

        let voucher = self
            .vouchers
            .get_mut(&id)
            .ok_or(LedgerError::VoucherNotFound(id))?;
        voucher.apply(draft);
        info!(voucher_id = %id, "Voucher replaced");
        Ok(voucher.clone())
    }

    /// Removes a voucher
    pub fn delete(&mut self, id: VoucherId, policy: &PostingPolicy) -> Result<Voucher, LedgerError> {
        let existing = self.vouchers.get(&id).ok_or(LedgerError::VoucherNotFound(id))?;
        policy.check_date(existing.date)?;

        let removed = self
            .vouchers
            .remove(&id)
            .ok_or(LedgerError::VoucherNotFound(id))?;
        info!(voucher_id = %id, "Voucher deleted");
        Ok(removed)
    }

    /// Appends a voucher that undoes `id` on `date`
    pub fn reverse(
        &mut self,
        id: VoucherId,
        date: NaiveDate,
        reason: &str,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        let draft = self
            .vouchers
            .get(&id)
            .ok_or(LedgerError::VoucherNotFound(id))?
            .reversal(date, reason);
        self.append(draft, chart, policy)
    }

    pub fn get(&self, id: VoucherId) -> Option<&Voucher> {
        self.vouchers.get(&id)
    }

    /// Vouchers inside the window, ascending by date then insertion order
    pub fn list_in_range(&self, window: &DateWindow) -> Vec<Voucher> {
        let mut selected: Vec<Voucher> = self
            .vouchers
            .values()
            .filter(|v| window.contains(v.date))
            .cloned()
            .collect();
        selected.sort_by_key(Voucher::sort_key);
        debug!(count = selected.len(), "Journal range read");
        selected
    }

    pub fn len(&self) -> usize {
        self.vouchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vouchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Group, Ledger, LedgerStatus, LedgerType, Nature};
    use core_kernel::{LedgerId, Money};
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn setup() -> (ChartOfAccounts, LedgerId, LedgerId) {
        let mut chart = ChartOfAccounts::new();
        let assets = Group::root("Assets", Nature::Asset);
        let income = Group::root("Income", Nature::Income);
        let cash = Ledger::new("Cash", &assets, LedgerType::Cash);
        let sales = Ledger::new("Sales", &income, LedgerType::General);
        let ids = (cash.id, sales.id);
        chart.add_group(assets).unwrap();
        chart.add_group(income).unwrap();
        chart.add_ledger(cash).unwrap();
        chart.add_ledger(sales).unwrap();
        (chart, ids.0, ids.1)
    }

    fn sale(cash: LedgerId, sales: LedgerId, on: NaiveDate, amount: Money) -> VoucherDraft {
        VoucherDraft::new("Cash sale", on)
            .debit(cash, amount)
            .credit(sales, amount)
    }

    #[test]
    fn test_unbalanced_append_leaves_journal_unchanged() {
        let (chart, cash, sales) = setup();
        let mut log = JournalLog::new();

        let draft = VoucherDraft::new("Broken", date(1, 1))
            .debit(cash, Money::new(dec!(100)))
            .credit(sales, Money::new(dec!(90)));

        let result = log.append(draft, &chart, &PostingPolicy::open());
        assert!(matches!(result, Err(LedgerError::UnbalancedVoucher { .. })));
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_unknown_account_rejected() {
        let (chart, cash, _) = setup();
        let mut log = JournalLog::new();
        let stranger = LedgerId::new();

        let result = log.append(
            sale(cash, stranger, date(1, 1), Money::new(dec!(10))),
            &chart,
            &PostingPolicy::open(),
        );
        assert!(matches!(result, Err(LedgerError::UnknownAccount(id)) if id == stranger));
        assert!(log.is_empty());
    }

    #[test]
    fn test_inactive_and_non_posting_rejected() {
        let (mut chart, cash, sales) = setup();
        let mut inactive = chart.get_ledger(sales).unwrap().clone();
        inactive.status = LedgerStatus::Inactive;
        chart.update_ledger(inactive).unwrap();

        let mut log = JournalLog::new();
        let result = log.append(
            sale(cash, sales, date(1, 1), Money::new(dec!(10))),
            &chart,
            &PostingPolicy::open(),
        );
        assert!(matches!(result, Err(LedgerError::InactiveAccount(_))));

        let mut summary = chart.get_ledger(cash).unwrap().clone();
        summary.is_posting = false;
        chart.update_ledger(summary).unwrap();
        let result = log.append(
            sale(cash, sales, date(1, 1), Money::new(dec!(10))),
            &chart,
            &PostingPolicy::open(),
        );
        assert!(matches!(result, Err(LedgerError::NonPostingAccount(_))));
    }

    #[test]
    fn test_range_is_ordered_by_date_then_insertion() {
        let (chart, cash, sales) = setup();
        let mut log = JournalLog::new();
        let policy = PostingPolicy::open();

        let late = log.append(sale(cash, sales, date(3, 1), Money::new(dec!(1))), &chart, &policy).unwrap();
        let first = log.append(sale(cash, sales, date(2, 1), Money::new(dec!(2))), &chart, &policy).unwrap();
        let second = log.append(sale(cash, sales, date(2, 1), Money::new(dec!(3))), &chart, &policy).unwrap();

        let ids: Vec<_> = log
            .list_in_range(&DateWindow::unbounded())
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id, late.id]);

        let feb = DateWindow::between(date(2, 1), date(2, 29)).unwrap();
        assert_eq!(log.list_in_range(&feb).len(), 2);
    }

    #[test]
    fn test_replace_keeps_identity_and_order() {
        let (chart, cash, sales) = setup();
        let mut log = JournalLog::new();
        let policy = PostingPolicy::open();

        let original = log.append(sale(cash, sales, date(1, 5), Money::new(dec!(10))), &chart, &policy).unwrap();
        let replaced = log
            .replace(original.id, sale(cash, sales, date(1, 5), Money::new(dec!(20))), &chart, &policy)
            .unwrap();

        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.sequence, original.sequence);
        assert_eq!(log.len(), 1);

        let bad = VoucherDraft::new("Broken", date(1, 5))
            .debit(cash, Money::new(dec!(5)))
            .credit(sales, Money::new(dec!(4)));
        assert!(log.replace(original.id, bad, &chart, &policy).is_err());
        assert_eq!(log.get(original.id).unwrap().entries, replaced.entries);
    }

    #[test]
    fn test_lock_date_blocks_writes_in_closed_period() {
        let (chart, cash, sales) = setup();
        let mut log = JournalLog::new();

        let kept = log
            .append(sale(cash, sales, date(1, 15), Money::new(dec!(10))), &chart, &PostingPolicy::open())
            .unwrap();

        let locked = PostingPolicy::locked_through(date(1, 31));
        let result = log.append(sale(cash, sales, date(1, 31), Money::new(dec!(10))), &chart, &locked);
        assert!(matches!(result, Err(LedgerError::PeriodLocked { .. })));
        assert!(matches!(log.delete(kept.id, &locked), Err(LedgerError::PeriodLocked { .. })));

        assert!(log.append(sale(cash, sales, date(2, 1), Money::new(dec!(10))), &chart, &locked).is_ok());
    }

    #[test]
    fn test_reverse_nets_to_zero() {
        let (chart, cash, sales) = setup();
        let mut log = JournalLog::new();
        let policy = PostingPolicy::open();

        let original = log.append(sale(cash, sales, date(1, 5), Money::new(dec!(10))), &chart, &policy).unwrap();
        let reversal = log.reverse(original.id, date(1, 6), "duplicate", &chart, &policy).unwrap();

        assert_eq!(reversal.reversal_of, Some(original.id));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_delete_missing_voucher() {
        let mut log = JournalLog::new();
        let result = log.delete(VoucherId::new(), &PostingPolicy::open());
        assert!(matches!(result, Err(LedgerError::VoucherNotFound(_))));
    }
}
