//! Kernel errors
//!
//! `CoreError` covers failures that happen before any ledger is touched:
//! arithmetic on amounts, date windows, and process settings.

use thiserror::Error;
use crate::money::MoneyError;
use crate::temporal::TemporalError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Amount error: {0}")]
    Money(#[from] MoneyError),

    #[error("Date window error: {0}")]
    Temporal(#[from] TemporalError),

    /// A setting parsed but holds a value the ledger cannot run with
    #[error("Invalid setting `{setting}`: {reason}")]
    InvalidSetting {
        setting: &'static str,
        reason: String,
    },

    /// Settings could not be read or deserialized at all
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn invalid_setting(setting: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidSetting {
            setting,
            reason: reason.into(),
        }
    }

    /// True for errors raised while loading or checking settings
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidSetting { .. } | CoreError::Configuration(_)
        )
    }
}
