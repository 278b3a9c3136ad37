//! Request and response bodies

pub mod chart;
pub mod party;
pub mod report;
pub mod voucher;

use chrono::NaiveDate;
use core_kernel::DateWindow;
use serde::Deserialize;

use crate::error::ApiError;

/// `?as_of=YYYY-MM-DD`
#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both optional and inclusive
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl WindowQuery {
    pub fn window(&self) -> Result<DateWindow, ApiError> {
        Ok(DateWindow::new(self.from, self.to)?)
    }
}
