//! Vouchers and their entries
//!
//! A voucher is one atomic, balanced financial event. Each entry moves an
//! amount on one side of one ledger. Debits are positive and credits are
//! negative when an entry is folded into a balance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{LedgerId, Money, VoucherId};

use crate::error::LedgerError;

/// One side of an entry
///
/// Exactly one side is set by construction. Amounts are magnitudes; the
/// variant carries the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", content = "amount", rename_all = "snake_case")]
pub enum Posting {
    Debit(Money),
    Credit(Money),
}

impl Posting {
    /// Magnitude of the posting
    pub fn amount(&self) -> Money {
        match self {
            Posting::Debit(m) | Posting::Credit(m) => *m,
        }
    }

    /// Contribution to the ledger balance, debit positive
    pub fn signed(&self) -> Money {
        match self {
            Posting::Debit(m) => *m,
            Posting::Credit(m) => -*m,
        }
    }

    /// Debit column value
    pub fn debit(&self) -> Money {
        match self {
            Posting::Debit(m) => *m,
            Posting::Credit(_) => Money::ZERO,
        }
    }

    /// Credit column value
    pub fn credit(&self) -> Money {
        match self {
            Posting::Debit(_) => Money::ZERO,
            Posting::Credit(m) => *m,
        }
    }

    /// The same amount on the opposite side
    pub fn reversed(&self) -> Self {
        match self {
            Posting::Debit(m) => Posting::Credit(*m),
            Posting::Credit(m) => Posting::Debit(*m),
        }
    }

    pub fn is_debit(&self) -> bool {
        matches!(self, Posting::Debit(_))
    }
}

/// A single line of a voucher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub account_id: LedgerId,
    #[serde(flatten)]
    pub posting: Posting,
    /// Optional line memo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl Entry {
    pub fn debit(account_id: LedgerId, amount: Money) -> Self {
        Self {
            account_id,
            posting: Posting::Debit(amount),
            memo: None,
        }
    }

    pub fn credit(account_id: LedgerId, amount: Money) -> Self {
        Self {
            account_id,
            posting: Posting::Credit(amount),
            memo: None,
        }
    }

    /// Builds an entry from separate debit and credit columns
    ///
    /// # Errors
    ///
    /// Returns `InvalidEntry` unless exactly one column is positive and the
    /// other is zero
    pub fn from_columns(
        account_id: LedgerId,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<Self, LedgerError> {
        let debit = Money::non_negative(debit)
            .map_err(|_| LedgerError::InvalidEntry(format!("negative debit on {}", account_id)))?;
        let credit = Money::non_negative(credit)
            .map_err(|_| LedgerError::InvalidEntry(format!("negative credit on {}", account_id)))?;

        match (debit.is_zero(), credit.is_zero()) {
            (false, true) => Ok(Self::debit(account_id, debit)),
            (true, false) => Ok(Self::credit(account_id, credit)),
            (false, false) => Err(LedgerError::InvalidEntry(format!(
                "entry on {} has both debit and credit",
                account_id
            ))),
            (true, true) => Err(LedgerError::InvalidEntry(format!(
                "entry on {} has no amount",
                account_id
            ))),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Voucher classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherType {
    Journal,
    Payment,
    Receipt,
    Sales,
    Purchase,
    Contra,
    Reversal,
}

impl VoucherType {
    pub fn code(&self) -> &'static str {
        match self {
            VoucherType::Journal => "journal",
            VoucherType::Payment => "payment",
            VoucherType::Receipt => "receipt",
            VoucherType::Sales => "sales",
            VoucherType::Purchase => "purchase",
            VoucherType::Contra => "contra",
            VoucherType::Reversal => "reversal",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "journal" => Some(VoucherType::Journal),
            "payment" => Some(VoucherType::Payment),
            "receipt" => Some(VoucherType::Receipt),
            "sales" => Some(VoucherType::Sales),
            "purchase" => Some(VoucherType::Purchase),
            "contra" => Some(VoucherType::Contra),
            "reversal" => Some(VoucherType::Reversal),
            _ => None,
        }
    }
}

/// Debit and credit column totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VoucherTotals {
    pub debits: Money,
    pub credits: Money,
}

impl VoucherTotals {
    /// Sums the columns of a set of entries
    pub fn of(entries: &[Entry]) -> Result<Self, LedgerError> {
        let mut totals = Self::default();
        for entry in entries {
            match entry.posting {
                Posting::Debit(m) => totals.debits = totals.debits.checked_add(&m)?,
                Posting::Credit(m) => totals.credits = totals.credits.checked_add(&m)?,
            }
        }
        Ok(totals)
    }

    /// Exact equality; amounts are fixed-scale decimals
    pub fn is_balanced(&self) -> bool {
        self.debits == self.credits
    }
}

/// An uncommitted voucher
///
/// # Example
///
/// ```rust,ignore
/// let draft = VoucherDraft::new("Cash sale", date)
///     .debit(cash, Money::new(dec!(500)))
///     .credit(sales, Money::new(dec!(500)));
///
/// let voucher = journal.append(draft, &chart, &policy)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherDraft {
    pub date: NaiveDate,
    pub narration: String,
    pub voucher_type: VoucherType,
    pub entries: Vec<Entry>,
    /// Set on vouchers that undo an earlier one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_of: Option<VoucherId>,
}

impl VoucherDraft {
    pub fn new(narration: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            date,
            narration: narration.into(),
            voucher_type: VoucherType::Journal,
            entries: Vec::new(),
            reversal_of: None,
        }
    }

    pub fn of_type(mut self, voucher_type: VoucherType) -> Self {
        self.voucher_type = voucher_type;
        self
    }

    pub fn debit(mut self, account_id: LedgerId, amount: Money) -> Self {
        self.entries.push(Entry::debit(account_id, amount));
        self
    }

    pub fn credit(mut self, account_id: LedgerId, amount: Money) -> Self {
        self.entries.push(Entry::credit(account_id, amount));
        self
    }

    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn totals(&self) -> Result<VoucherTotals, LedgerError> {
        VoucherTotals::of(&self.entries)
    }

    /// Checks everything that does not need the chart
    ///
    /// # Errors
    ///
    /// - `EmptyNarration` for a blank narration
    /// - `InvalidEntry` for a zero or negative line
    /// - `ZeroValueVoucher` for no entries or a zero total
    /// - `UnbalancedVoucher` when the columns differ
    pub fn check_shape(&self) -> Result<VoucherTotals, LedgerError> {
        if self.narration.trim().is_empty() {
            return Err(LedgerError::EmptyNarration);
        }
        if self.entries.is_empty() {
            return Err(LedgerError::ZeroValueVoucher);
        }

        for entry in &self.entries {
            if !entry.posting.amount().is_positive() {
                return Err(LedgerError::InvalidEntry(format!(
                    "amount on {} must be positive",
                    entry.account_id
                )));
            }
        }

        let totals = self.totals()?;
        if !totals.is_balanced() {
            return Err(LedgerError::UnbalancedVoucher {
                debits: totals.debits,
                credits: totals.credits,
            });
        }
        if totals.debits.is_zero() {
            return Err(LedgerError::ZeroValueVoucher);
        }

        Ok(totals)
    }
}

/// A committed voucher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub date: NaiveDate,
    pub narration: String,
    pub voucher_type: VoucherType,
    pub entries: Vec<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_of: Option<VoucherId>,
    /// Insertion order, breaks ties between vouchers on the same date
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Voucher {
    /// Commits a draft under the given id and sequence
    pub fn from_draft(id: VoucherId, sequence: u64, draft: VoucherDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            date: draft.date,
            narration: draft.narration,
            voucher_type: draft.voucher_type,
            entries: draft.entries,
            reversal_of: draft.reversal_of,
            sequence,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the content, keeping identity and insertion order
    pub fn apply(&mut self, draft: VoucherDraft) {
        self.date = draft.date;
        self.narration = draft.narration;
        self.voucher_type = draft.voucher_type;
        self.entries = draft.entries;
        self.reversal_of = draft.reversal_of;
        self.updated_at = Utc::now();
    }

    pub fn totals(&self) -> Result<VoucherTotals, LedgerError> {
        VoucherTotals::of(&self.entries)
    }

    /// A draft that undoes this voucher on `date`
    pub fn reversal(&self, date: NaiveDate, reason: &str) -> VoucherDraft {
        VoucherDraft {
            date,
            narration: format!("Reversal of {}: {}", self.id, reason),
            voucher_type: VoucherType::Reversal,
            entries: self
                .entries
                .iter()
                .map(|e| Entry {
                    account_id: e.account_id,
                    posting: e.posting.reversed(),
                    memo: e.memo.clone(),
                })
                .collect(),
            reversal_of: Some(self.id),
        }
    }

    /// Ordering key for journal reads
    pub fn sort_key(&self) -> (NaiveDate, u64) {
        (self.date, self.sequence)
    }
}
