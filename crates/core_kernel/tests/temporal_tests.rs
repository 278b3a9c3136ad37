//! Unit tests for date windows

use chrono::NaiveDate;
use core_kernel::{DateWindow, TemporalError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_new_allows_single_day_window() {
    let window = DateWindow::new(Some(date(2024, 5, 1)), Some(date(2024, 5, 1))).unwrap();
    assert!(window.contains(date(2024, 5, 1)));
    assert!(!window.contains(date(2024, 5, 2)));
}

#[test]
fn test_new_rejects_inverted_bounds() {
    assert_eq!(
        DateWindow::new(Some(date(2024, 5, 2)), Some(date(2024, 5, 1))),
        Err(TemporalError::InvalidWindow {
            start: date(2024, 5, 2),
            end: date(2024, 5, 1),
        })
    );
}

#[test]
fn test_half_open_windows() {
    let up_to = DateWindow::up_to(date(2024, 1, 31));
    assert!(up_to.contains(date(1999, 1, 1)));
    assert!(!up_to.contains(date(2024, 2, 1)));

    let starting = DateWindow::starting(date(2024, 1, 31));
    assert!(!starting.contains(date(2024, 1, 30)));
    assert!(starting.contains(date(2099, 1, 1)));
}

#[test]
fn test_default_is_unbounded() {
    assert!(DateWindow::default().is_unbounded());
}
