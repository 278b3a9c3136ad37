//! Party entity
//!
//! A party is a customer or supplier record owned by the order and purchasing
//! flows. The ledger only cares about two things: which side of the books the
//! party sits on, and which ledger account (if any) records its balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{LedgerId, PartyId};
use crate::error::PartyError;

/// Which side of trade the party sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    /// Buys from the business; balances are trade receivables
    Customer,
    /// Sells to the business; balances are trade payables
    Supplier,
}

impl PartyKind {
    /// Returns true for customers
    pub fn is_customer(&self) -> bool {
        matches!(self, PartyKind::Customer)
    }

    /// Returns the storage code
    pub fn code(&self) -> &'static str {
        match self {
            PartyKind::Customer => "customer",
            PartyKind::Supplier => "supplier",
        }
    }

    /// Parses a storage code
    ///
    /// "vendor" is accepted as a synonym for supplier.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "customer" => Some(PartyKind::Customer),
            "supplier" | "vendor" => Some(PartyKind::Supplier),
            _ => None,
        }
    }
}

/// A customer or supplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Party {
    /// Unique identifier
    pub id: PartyId,
    /// Display name, also used to find legacy ledgers created by hand
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Customer or supplier
    pub kind: PartyKind,
    /// Contact email
    #[validate(email)]
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Weak reference to the ledger recording this party's balance
    pub coa_ledger_id: Option<LedgerId>,
    /// Whether the party is active
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Party {
    /// Creates a new active party with no ledger binding
    pub fn new(name: impl Into<String>, kind: PartyKind) -> Self {
        let now = Utc::now();
        Self {
            id: PartyId::new(),
            name: name.into(),
            kind,
            email: None,
            phone: None,
            coa_ledger_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the contact email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Validates the party's fields
    ///
    /// # Errors
    ///
    /// Returns `PartyError::InvalidFields` listing every failing field
    pub fn validate_fields(&self) -> Result<(), PartyError> {
        self.validate().map_err(|errors| {
            let mut messages: Vec<String> = errors
                .field_errors()
                .iter()
                .map(|(field, errs)| {
                    let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                    format!("{}: {}", field, codes.join(", "))
                })
                .collect();
            messages.sort();
            PartyError::InvalidFields(messages)
        })
    }

    /// Binds the party to a ledger, compare-and-set style
    ///
    /// The binding changes only when the current reference equals
    /// `expected`. Binding to the ledger already referenced is a no-op.
    /// Anything else is refused so a retry can never silently move a
    /// party's balance history.
    pub fn bind_ledger(
        &mut self,
        expected: Option<LedgerId>,
        ledger_id: LedgerId,
    ) -> Result<(), PartyError> {
        if self.coa_ledger_id == Some(ledger_id) {
            return Ok(());
        }
        if self.coa_ledger_id != expected {
            return Err(PartyError::BindingMismatch {
                party: self.id,
                current: self.coa_ledger_id,
                expected,
            });
        }
        self.coa_ledger_id = Some(ledger_id);
        self.updated_at = Utc::now();
        Ok(())
    }
}
