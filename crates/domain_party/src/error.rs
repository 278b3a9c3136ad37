//! Party errors

use thiserror::Error;

use core_kernel::{LedgerId, PartyId, PortError};

#[derive(Debug, Error)]
pub enum PartyError {
    /// One entry per failing field, already formatted as `field: reason`
    #[error("Invalid party: {}", .0.join("; "))]
    InvalidFields(Vec<String>),

    /// The compare-and-set on the ledger reference saw a different value
    #[error("Party {party} references ledger {}, expected {}", describe(.current), describe(.expected))]
    BindingMismatch {
        party: PartyId,
        current: Option<LedgerId>,
        expected: Option<LedgerId>,
    },
}

fn describe(ledger: &Option<LedgerId>) -> String {
    ledger.map_or_else(|| "none".to_string(), |id| id.to_string())
}

impl From<PartyError> for PortError {
    fn from(err: PartyError) -> Self {
        match err {
            PartyError::InvalidFields(_) => PortError::validation(err.to_string()),
            PartyError::BindingMismatch { .. } => PortError::conflict(err.to_string()),
        }
    }
}
