//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Duration, NaiveDate};
use core_kernel::{LedgerId, Money};
use domain_ledger::{Entry, VoucherDraft};
use proptest::prelude::*;

use crate::fixtures::DateFixtures;

/// Strategy for positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(Money::from_minor)
}

/// Strategy for signed Money values
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (-100_000_000i64..100_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for dates inside the fixture financial year
pub fn date_in_fy_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..365i64).prop_map(|days| DateFixtures::fy_start() + Duration::days(days))
}

/// Strategy for balanced entry lists over the given accounts
///
/// Each generated pair debits one account and credits another by the same
/// amount, so the list balances by construction.
pub fn balanced_entries_strategy(accounts: Vec<LedgerId>) -> impl Strategy<Value = Vec<Entry>> {
    let n = accounts.len();
    proptest::collection::vec((0..n, 0..n, positive_money_strategy()), 1..5).prop_map(
        move |pairs| {
            pairs
                .into_iter()
                .flat_map(|(dr, cr, amount)| {
                    [
                        Entry::debit(accounts[dr], amount),
                        Entry::credit(accounts[cr], amount),
                    ]
                })
                .collect()
        },
    )
}

/// Strategy for valid voucher drafts over the given accounts
pub fn voucher_draft_strategy(accounts: Vec<LedgerId>) -> impl Strategy<Value = VoucherDraft> {
    (balanced_entries_strategy(accounts), date_in_fy_strategy()).prop_map(|(entries, date)| {
        let mut draft = VoucherDraft::new("Generated voucher", date);
        draft.entries = entries;
        draft
    })
}

/// Strategy for drafts whose debits exceed credits by a positive skew
pub fn unbalanced_draft_strategy(accounts: Vec<LedgerId>) -> impl Strategy<Value = VoucherDraft> {
    (voucher_draft_strategy(accounts.clone()), positive_money_strategy(), 0..accounts.len()).prop_map(
        move |(mut draft, skew, idx)| {
            draft.entries.push(Entry::debit(accounts[idx], skew));
            draft
        },
    )
}

/// Strategy for a journal's worth of valid drafts
pub fn journal_strategy(
    accounts: Vec<LedgerId>,
    max_vouchers: usize,
) -> impl Strategy<Value = Vec<VoucherDraft>> {
    proptest::collection::vec(voucher_draft_strategy(accounts), 0..max_vouchers)
}
