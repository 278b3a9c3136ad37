//! Party DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_ledger::Ledger;
use domain_party::{Party, PartyKind};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePartyRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: PartyKind,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CreatePartyRequest {
    pub fn into_party(self) -> Party {
        let mut party = Party::new(self.name, self.kind);
        party.email = self.email;
        party.phone = self.phone;
        party
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPartiesQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// A party together with its resolved ledger
#[derive(Debug, Serialize)]
pub struct PartyLedgerResponse {
    pub party: Party,
    pub ledger: Ledger,
}
