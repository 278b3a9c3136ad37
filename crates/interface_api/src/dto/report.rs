//! Report DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{DateWindow, LedgerId, Money};
use domain_ledger::{BalanceMode, BalanceSet, DataIntegrityWarning, LedgerError};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BalanceModeParam {
    #[default]
    Cumulative,
    Movement,
}

/// `?mode=cumulative&as_of=...` or `?mode=movement&from=...&to=...`
#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    #[serde(default)]
    pub mode: BalanceModeParam,
    pub as_of: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl BalanceQuery {
    pub fn balance_mode(&self) -> Result<BalanceMode, ApiError> {
        match self.mode {
            BalanceModeParam::Cumulative => {
                if self.from.is_some() || self.to.is_some() {
                    return Err(ApiError::BadRequest(
                        "cumulative balances take as_of, not from/to".to_string(),
                    ));
                }
                Ok(BalanceMode::Cumulative { as_of: self.as_of })
            }
            BalanceModeParam::Movement => {
                if self.as_of.is_some() {
                    return Err(ApiError::BadRequest(
                        "movement balances take from/to, not as_of".to_string(),
                    ));
                }
                Ok(BalanceMode::movement(DateWindow::new(self.from, self.to)?))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LedgerBalance {
    pub ledger_id: LedgerId,
    pub balance: Money,
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub mode: BalanceMode,
    pub balances: Vec<LedgerBalance>,
    /// Sum of every balance; zero for a consistent journal in movement mode
    pub total: Money,
    pub warnings: Vec<DataIntegrityWarning>,
}

impl BalancesResponse {
    pub fn new(mode: BalanceMode, set: BalanceSet) -> Result<Self, LedgerError> {
        let mut balances: Vec<LedgerBalance> = set
            .iter()
            .map(|(ledger_id, balance)| LedgerBalance { ledger_id, balance })
            .collect();
        balances.sort_by_key(|b| b.ledger_id);

        Ok(Self {
            mode,
            total: set.total()?,
            balances,
            warnings: set.warnings,
        })
    }
}
