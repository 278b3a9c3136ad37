//! Chart of accounts DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use domain_ledger::{DrCr, LedgerType, Nature};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Omitted for a root group
    pub parent_id: Option<Uuid>,
    /// Required for a root group; a child inherits its parent's unless set
    pub nature: Option<Nature>,
}

#[derive(Debug, Deserialize)]
pub struct MoveGroupRequest {
    /// `null` promotes the group to a root
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct OpeningBalanceRequest {
    pub amount: Decimal,
    pub side: DrCr,
    pub as_of: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLedgerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub group_id: Uuid,
    #[serde(default = "default_ledger_type")]
    pub ledger_type: LedgerType,
    pub opening_balance: Option<OpeningBalanceRequest>,
    #[serde(default = "default_is_posting")]
    pub is_posting: bool,
}

fn default_ledger_type() -> LedgerType {
    LedgerType::General
}

fn default_is_posting() -> bool {
    true
}
