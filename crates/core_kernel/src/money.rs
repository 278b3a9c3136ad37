//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//! The ledger runs in a single reporting currency, so `Money` carries no
//! currency code.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use thiserror::Error;

/// Number of fractional digits kept internally
pub const STORAGE_SCALE: u32 = 4;

/// Number of fractional digits used for display
pub const DISPLAY_SCALE: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Negative amount not allowed: {0}")]
    Negative(Decimal),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A signed monetary amount
///
/// Money uses rust_decimal for precise arithmetic without floating-point errors.
/// Amounts are stored with 4 decimal places internally and displayed with 2.
/// Under the ledger's sign convention a positive value is a debit and a
/// negative value is a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    amount: Decimal,
}

impl Money {
    /// The zero amount
    pub const ZERO: Money = Money { amount: Decimal::ZERO };

    /// Creates a new Money value
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount: amount.round_dp(STORAGE_SCALE),
        }
    }

    /// Creates a Money value that must not be negative
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for amounts below zero
    pub fn non_negative(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self::new(amount))
    }

    /// Creates Money from an integer amount in minor units (cents)
    pub fn from_minor(minor_units: i64) -> Self {
        Self::new(Decimal::new(minor_units, DISPLAY_SCALE))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self {
            amount: self.amount.abs(),
        }
    }

    /// Returns the positive part (`max(self, 0)`)
    pub fn positive_part(&self) -> Self {
        if self.is_positive() {
            *self
        } else {
            Self::ZERO
        }
    }

    /// Returns the negated negative part (`max(-self, 0)`)
    pub fn negative_part(&self) -> Self {
        if self.is_negative() {
            -*self
        } else {
            Self::ZERO
        }
    }

    /// Rounds to the display scale using banker's rounding
    pub fn round_for_display(&self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                DISPLAY_SCALE,
                rust_decimal::RoundingStrategy::MidpointNearestEven,
            ),
        }
    }

    /// Checked addition that returns an error on overflow
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.amount
            .checked_add(other.amount)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Sums amounts, failing instead of panicking on overflow
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Result<Money, MoneyError> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(&m))
    }

    /// Checked subtraction that returns an error on overflow
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.amount
            .checked_sub(other.amount)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Multiplies by a scalar (quantity times unit cost)
    pub fn checked_mul(&self, factor: Decimal) -> Result<Money, MoneyError> {
        self.amount
            .checked_mul(factor)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Returns true if `self` and `other` differ by no more than `tolerance`
    pub fn approx_eq(&self, other: &Money, tolerance: Decimal) -> bool {
        self.amount
            .checked_sub(other.amount)
            .is_some_and(|diff| diff.abs() <= tolerance)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.dp$}",
            self.round_for_display().amount,
            dp = DISPLAY_SCALE as usize
        )
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

// The operators panic on overflow, like `Decimal`'s; ledger folds use the
// checked forms.
impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.amount + other.amount)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.amount - other.amount)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self { amount: -self.amount }
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

/// Default tolerance used when comparing legacy totals
pub fn default_tolerance() -> Decimal {
    dec!(0.01)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50));
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(50.00));

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
        assert_eq!((-a).amount(), dec!(-100.00));
    }

    #[test]
    fn test_non_negative_rejects_negative() {
        assert!(Money::non_negative(dec!(0)).is_ok());
        assert_eq!(
            Money::non_negative(dec!(-0.01)),
            Err(MoneyError::Negative(dec!(-0.01)))
        );
    }

    #[test]
    fn test_positive_and_negative_parts() {
        let debit = Money::new(dec!(1500));
        let credit = Money::new(dec!(-500));

        assert_eq!(debit.positive_part(), debit);
        assert_eq!(debit.negative_part(), Money::ZERO);
        assert_eq!(credit.positive_part(), Money::ZERO);
        assert_eq!(credit.negative_part(), Money::new(dec!(500)));
    }

    #[test]
    fn test_display_uses_two_places() {
        assert_eq!(Money::new(dec!(1500)).to_string(), "1500.00");
        assert_eq!(Money::new(dec!(-0.125)).to_string(), "-0.12");
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max.checked_add(&Money::new(Decimal::MAX)), Err(MoneyError::Overflow));
    }
}
