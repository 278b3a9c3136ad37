//! Ledger engine settings

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use core_kernel::default_tolerance;

use crate::journal::PostingPolicy;
use crate::report::{CogsBasis, PartyScope};

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_bind_attempts() -> u32 {
    5
}

/// Tunables for posting and reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Largest trial-balance difference still reported as balanced
    #[serde(default = "default_tolerance")]
    pub integrity_tolerance: Decimal,
    /// Deadline for a report's journal read
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Closed-period boundary, inclusive
    #[serde(default)]
    pub lock_date: Option<NaiveDate>,
    #[serde(default)]
    pub cogs_basis: CogsBasis,
    #[serde(default)]
    pub party_scope: PartyScope,
    /// How often the party binder retries after losing a binding race
    #[serde(default = "default_bind_attempts")]
    pub bind_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            integrity_tolerance: default_tolerance(),
            read_timeout_ms: default_read_timeout_ms(),
            lock_date: None,
            cogs_basis: CogsBasis::default(),
            party_scope: PartyScope::default(),
            bind_attempts: default_bind_attempts(),
        }
    }
}

impl LedgerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn posting_policy(&self) -> PostingPolicy {
        PostingPolicy {
            lock_date: self.lock_date,
        }
    }

    pub fn with_lock_date(mut self, date: NaiveDate) -> Self {
        self.lock_date = Some(date);
        self
    }

    pub fn with_cogs_basis(mut self, basis: CogsBasis) -> Self {
        self.cogs_basis = basis;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.integrity_tolerance, dec!(0.01));
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.cogs_basis, CogsBasis::Orders);
        assert_eq!(config.posting_policy(), PostingPolicy::open());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"lock_date": "2024-03-31", "cogs_basis": "ledger"}"#).unwrap();
        assert_eq!(config.lock_date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(config.cogs_basis, CogsBasis::Ledger);
        assert_eq!(config.read_timeout_ms, 30_000);
        assert_eq!(config.bind_attempts, 5);
    }

    #[test]
    fn test_bind_attempts_override() {
        let config: LedgerConfig = serde_json::from_str(r#"{"bind_attempts": 2}"#).unwrap();
        assert_eq!(config.bind_attempts, 2);
    }
}
