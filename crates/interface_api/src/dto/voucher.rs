//! Voucher DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::LedgerId;
use domain_ledger::{Entry, LedgerError, VoucherDraft, VoucherType};

/// One line of a voucher, in debit and credit columns
#[derive(Debug, Deserialize, Serialize)]
pub struct EntryRequest {
    pub account_id: Uuid,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    pub memo: Option<String>,
}

impl EntryRequest {
    fn into_entry(self) -> Result<Entry, LedgerError> {
        let entry = Entry::from_columns(LedgerId::from_uuid(self.account_id), self.debit, self.credit)?;
        Ok(match self.memo {
            Some(memo) => entry.with_memo(memo),
            None => entry,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostVoucherRequest {
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 500))]
    pub narration: String,
    pub voucher_type: Option<VoucherType>,
    #[validate(length(min = 2))]
    pub entries: Vec<EntryRequest>,
}

impl PostVoucherRequest {
    /// Converts the columns into a draft; balance is checked on posting
    pub fn into_draft(self) -> Result<VoucherDraft, LedgerError> {
        let mut draft = VoucherDraft::new(self.narration, self.date);
        if let Some(voucher_type) = self.voucher_type {
            draft = draft.of_type(voucher_type);
        }
        for entry in self.entries {
            draft = draft.entry(entry.into_entry()?);
        }
        Ok(draft)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReverseVoucherRequest {
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}
