//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for ledger types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_ledger::{BalanceSet, DataIntegrityWarning, TrialBalanceReport};
use rust_decimal::Decimal;

/// Asserts that two Money values are exactly equal
pub fn assert_money_eq(actual: Money, expected: Money) {
    assert_eq!(
        actual, expected,
        "Money mismatch: actual={}, expected={}",
        actual, expected
    );
}

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: Money, expected: Money, tolerance: Decimal) {
    assert!(
        actual.approx_eq(&expected, tolerance),
        "Money amounts differ by more than tolerance: actual={}, expected={}, tolerance={}",
        actual,
        expected,
        tolerance
    );
}

/// Asserts that a trial balance's columns match exactly and carry no warnings
pub fn assert_trial_balance_balanced(report: &TrialBalanceReport) {
    assert_eq!(
        report.total_debit, report.total_credit,
        "Trial balance out of balance: debit={}, credit={}",
        report.total_debit, report.total_credit
    );
    assert!(report.is_balanced, "Trial balance flagged unbalanced");
    assert_no_warnings(&report.warnings);
}

/// Asserts that signed balances across all ledgers sum to zero
pub fn assert_balances_sum_to_zero(balances: &BalanceSet) {
    let total = balances.total().expect("balance total overflowed");
    assert!(total.is_zero(), "Balances sum to {}, expected zero", total);
}

/// Asserts an empty warning list
pub fn assert_no_warnings(warnings: &[DataIntegrityWarning]) {
    assert!(warnings.is_empty(), "Unexpected integrity warnings: {:?}", warnings);
}
