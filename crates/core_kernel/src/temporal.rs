//! Business-date windows
//!
//! Vouchers carry a business date that is distinct from the wall-clock
//! `created_at` timestamp. Queries against the journal select vouchers by
//! business date through a `DateWindow`, whose bounds are inclusive and
//! optional: a missing bound is unbounded in that direction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow {
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// An inclusive range of business dates
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use core_kernel::DateWindow;
///
/// let march = DateWindow::between(
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
/// ).unwrap();
///
/// assert!(march.contains(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
/// assert!(!march.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateWindow {
    /// First business date included, `None` for unbounded
    pub from: Option<NaiveDate>,
    /// Last business date included, `None` for unbounded
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    /// Creates a window, validating that `from <= to` when both are given
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, TemporalError> {
        if let (Some(start), Some(end)) = (from, to) {
            if start > end {
                return Err(TemporalError::InvalidWindow { start, end });
            }
        }
        Ok(Self { from, to })
    }

    /// The window covering all of history
    pub fn unbounded() -> Self {
        Self { from: None, to: None }
    }

    /// Everything up to and including `date`
    pub fn up_to(date: NaiveDate) -> Self {
        Self { from: None, to: Some(date) }
    }

    /// Everything from `date` onwards
    pub fn starting(date: NaiveDate) -> Self {
        Self { from: Some(date), to: None }
    }

    /// A closed window
    pub fn between(from: NaiveDate, to: NaiveDate) -> Result<Self, TemporalError> {
        Self::new(Some(from), Some(to))
    }

    /// Returns true if the date falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }

    /// Returns true if neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// The part of history strictly before this window's start
    ///
    /// Returns `None` when the window has no lower bound.
    pub fn before_start(&self) -> Option<DateWindow> {
        self.from
            .and_then(|f| f.pred_opt())
            .map(DateWindow::up_to)
    }
}
