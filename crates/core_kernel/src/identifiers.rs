//! Identifiers for groups, ledgers, vouchers, parties and order records
//!
//! Each is a UUID newtype, so a voucher id can never be passed where a
//! ledger id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal, $generate:path) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self($generate())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        /// Prefixed form, e.g. `LGR-<uuid>`, used in logs and error messages
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        /// Accepts both the prefixed form and a bare UUID
        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bare = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Uuid::parse_str(bare).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(GroupId, "GRP", Uuid::new_v4);
define_id!(LedgerId, "LGR", Uuid::new_v4);
// Time-ordered, so ids sort in posting order within a day
define_id!(VoucherId, "VCH", Uuid::now_v7);
define_id!(PartyId, "PTY", Uuid::new_v4);
define_id!(ProductId, "PRD", Uuid::new_v4);
define_id!(OrderId, "ORD", Uuid::new_v4);

/// Namespace for ledger ids derived from party ids
const PARTY_LEDGER_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6c, 0x65, 0x64, 0x67, 0x65, 0x72, 0x2d, 0x70,
    0x61, 0x72, 0x74, 0x79, 0x2d, 0x6e, 0x73, 0x31,
]);

impl LedgerId {
    /// Derives the ledger id reserved for a party
    ///
    /// The id is a name-based (v5) UUID of the party id, so every caller
    /// resolving the same party computes the same ledger id. Storage can then
    /// reject the second insert instead of creating a duplicate account.
    pub fn for_party(party_id: PartyId) -> Self {
        Self(Uuid::new_v5(&PARTY_LEDGER_NAMESPACE, party_id.as_uuid().as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_id_display() {
        let id = LedgerId::new();
        let display = id.to_string();
        assert!(display.starts_with("LGR-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = VoucherId::new();
        let parsed: VoucherId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let group_id = GroupId::from(uuid);
        let back: Uuid = group_id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_party_ledger_id_is_deterministic() {
        let party = PartyId::new();
        assert_eq!(LedgerId::for_party(party), LedgerId::for_party(party));
        assert_ne!(LedgerId::for_party(party), LedgerId::for_party(PartyId::new()));
    }
}
