//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::NaiveDate;
use core_kernel::{LedgerId, Money};
use domain_ledger::{Entry, VoucherDraft, VoucherType};
use domain_party::{Party, PartyKind};
use rust_decimal::Decimal;

use crate::fixtures::DateFixtures;

/// Builder for voucher drafts
pub struct TestVoucherBuilder {
    narration: String,
    date: NaiveDate,
    voucher_type: VoucherType,
    entries: Vec<Entry>,
}

impl Default for TestVoucherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVoucherBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            narration: "Test voucher".to_string(),
            date: DateFixtures::q1_day(),
            voucher_type: VoucherType::Journal,
            entries: Vec::new(),
        }
    }

    pub fn narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = narration.into();
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn of_type(mut self, voucher_type: VoucherType) -> Self {
        self.voucher_type = voucher_type;
        self
    }

    /// Adds a debit in whole units
    pub fn debit(mut self, account: LedgerId, amount: Decimal) -> Self {
        self.entries.push(Entry::debit(account, Money::new(amount)));
        self
    }

    /// Adds a credit in whole units
    pub fn credit(mut self, account: LedgerId, amount: Decimal) -> Self {
        self.entries.push(Entry::credit(account, Money::new(amount)));
        self
    }

    /// Debits one account and credits another by the same amount
    pub fn transfer(self, from_debit: LedgerId, to_credit: LedgerId, amount: Decimal) -> Self {
        self.debit(from_debit, amount).credit(to_credit, amount)
    }

    pub fn build(self) -> VoucherDraft {
        let mut draft = VoucherDraft::new(self.narration, self.date).of_type(self.voucher_type);
        draft.entries = self.entries;
        draft
    }
}

/// Builder for parties
pub struct TestPartyBuilder {
    name: String,
    kind: PartyKind,
    email: Option<String>,
    ledger: Option<LedgerId>,
    active: bool,
}

impl TestPartyBuilder {
    pub fn customer(name: impl Into<String>) -> Self {
        Self::new(name, PartyKind::Customer)
    }

    pub fn supplier(name: impl Into<String>) -> Self {
        Self::new(name, PartyKind::Supplier)
    }

    fn new(name: impl Into<String>, kind: PartyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            email: None,
            ledger: None,
            active: true,
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn bound_to(mut self, ledger: LedgerId) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> Party {
        let mut party = Party::new(self.name, self.kind);
        party.email = self.email;
        party.coa_ledger_id = self.ledger;
        party.is_active = self.active;
        party
    }
}
