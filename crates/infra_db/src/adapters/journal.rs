//! PostgreSQL Journal Adapter
//!
//! Implements `JournalPort` over `vouchers` and `voucher_entries`. Every
//! write takes the journal advisory lock, validates, and commits inside a
//! single transaction.
//!
//! The chart snapshot a caller passes in may be older than the lock, so
//! appends and replacements re-read the flags of the ledgers they touch
//! inside the transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use core_kernel::{DateWindow, DomainPort, HealthCheckResult, HealthCheckable, LedgerId, VoucherId};
use domain_ledger::{
    validate_draft, ChartOfAccounts, Entry, JournalPort, LedgerError, PostingPolicy, Voucher,
    VoucherDraft, VoucherType,
};

use super::{lock_xact, ping, JOURNAL_LOCK_KEY};
use crate::error::{ledger_db_error, DatabaseError};

#[derive(Debug, sqlx::FromRow)]
struct VoucherRow {
    id: Uuid,
    sequence: i64,
    voucher_date: NaiveDate,
    narration: String,
    voucher_type: String,
    reversal_of: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    voucher_id: Uuid,
    ledger_id: Uuid,
    debit: Decimal,
    credit: Decimal,
    memo: Option<String>,
}

impl EntryRow {
    fn into_entry(self) -> Result<Entry, LedgerError> {
        let entry = Entry::from_columns(LedgerId::from_uuid(self.ledger_id), self.debit, self.credit)?;
        Ok(match self.memo {
            Some(memo) => entry.with_memo(memo),
            None => entry,
        })
    }
}

impl VoucherRow {
    fn into_voucher(self, entries: Vec<Entry>) -> Result<Voucher, LedgerError> {
        let voucher_type = VoucherType::from_code(&self.voucher_type)
            .ok_or_else(|| DatabaseError::bad_code("voucher_type", &self.voucher_type))?;

        Ok(Voucher {
            id: VoucherId::from_uuid(self.id),
            date: self.voucher_date,
            narration: self.narration,
            voucher_type,
            entries,
            reversal_of: self.reversal_of.map(VoucherId::from_uuid),
            sequence: self.sequence.max(0) as u64,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const VOUCHER_COLUMNS: &str =
    "id, sequence, voucher_date, narration, voucher_type, reversal_of, created_at, updated_at";

async fn fetch_entries(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Entry>>, LedgerError> {
    let rows: Vec<EntryRow> = sqlx::query_as(
        "SELECT voucher_id, ledger_id, debit, credit, memo FROM voucher_entries \
         WHERE voucher_id = ANY($1) ORDER BY voucher_id, line_no",
    )
    .bind(ids)
    .fetch_all(conn)
    .await
    .map_err(ledger_db_error)?;

    let mut grouped: HashMap<Uuid, Vec<Entry>> = HashMap::new();
    for row in rows {
        let voucher_id = row.voucher_id;
        grouped.entry(voucher_id).or_default().push(row.into_entry()?);
    }
    Ok(grouped)
}

async fn fetch_voucher(
    conn: &mut PgConnection,
    id: VoucherId,
    for_update: bool,
) -> Result<Voucher, LedgerError> {
    let sql = format!(
        "SELECT {} FROM vouchers WHERE id = $1{}",
        VOUCHER_COLUMNS,
        if for_update { " FOR UPDATE" } else { "" }
    );
    let row: Option<VoucherRow> = sqlx::query_as(&sql)
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await
        .map_err(ledger_db_error)?;
    let row = row.ok_or(LedgerError::VoucherNotFound(id))?;

    let mut entries = fetch_entries(conn, &[row.id]).await?;
    let lines = entries.remove(&row.id).unwrap_or_default();
    row.into_voucher(lines)
}

async fn insert_entries(conn: &mut PgConnection, voucher: &Voucher) -> Result<(), LedgerError> {
    for (line_no, entry) in voucher.entries.iter().enumerate() {
        sqlx::query(
            "INSERT INTO voucher_entries (voucher_id, line_no, ledger_id, debit, credit, memo) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::from(voucher.id))
        .bind(line_no as i32)
        .bind(Uuid::from(entry.account_id))
        .bind(entry.posting.debit().amount())
        .bind(entry.posting.credit().amount())
        .bind(entry.memo.as_deref())
        .execute(&mut *conn)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::ForeignKeyViolation(_) => LedgerError::UnknownAccount(entry.account_id),
            other => other.into(),
        })?;
    }
    Ok(())
}

/// PostgreSQL-backed journal
#[derive(Debug, Clone)]
pub struct PostgresJournalStore {
    pool: PgPool,
}

impl PostgresJournalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresJournalStore {}

#[async_trait]
impl HealthCheckable for PostgresJournalStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-journal-store").await
    }
}

/// Re-reads the posting flags of every ledger a draft touches
///
/// The rows stay share-locked until commit, so a concurrent `update_ledger`
/// either lands before this read or waits for the posting to finish.
async fn recheck_accounts(conn: &mut PgConnection, draft: &VoucherDraft) -> Result<(), LedgerError> {
    let ids: Vec<Uuid> = draft.entries.iter().map(|e| Uuid::from(e.account_id)).collect();
    let rows: Vec<(Uuid, bool, bool)> = sqlx::query_as(
        "SELECT id, is_posting, is_active FROM ledgers WHERE id = ANY($1) FOR SHARE",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(ledger_db_error)?;

    let flags: HashMap<Uuid, (bool, bool)> = rows
        .into_iter()
        .map(|(id, is_posting, is_active)| (id, (is_posting, is_active)))
        .collect();

    for id in ids {
        let ledger_id = LedgerId::from_uuid(id);
        match flags.get(&id) {
            None => return Err(LedgerError::UnknownAccount(ledger_id)),
            Some((false, _)) => return Err(LedgerError::NonPostingAccount(ledger_id)),
            Some((_, false)) => return Err(LedgerError::InactiveAccount(ledger_id)),
            Some(_) => {}
        }
    }
    Ok(())
}

#[async_trait]
impl JournalPort for PostgresJournalStore {
    #[instrument(skip_all, fields(date = %draft.date))]
    async fn append(
        &self,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(ledger_db_error)?;
        lock_xact(&mut tx, JOURNAL_LOCK_KEY).await.map_err(ledger_db_error)?;

        let totals = validate_draft(&draft, chart, policy)?;
        recheck_accounts(&mut tx, &draft).await?;
        let mut voucher = Voucher::from_draft(VoucherId::new(), 0, draft);

        let sequence: i64 = sqlx::query_scalar(
            "INSERT INTO vouchers (id, voucher_date, narration, voucher_type, reversal_of, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING sequence",
        )
        .bind(Uuid::from(voucher.id))
        .bind(voucher.date)
        .bind(&voucher.narration)
        .bind(voucher.voucher_type.code())
        .bind(voucher.reversal_of.map(Uuid::from))
        .bind(voucher.created_at)
        .bind(voucher.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(ledger_db_error)?;
        voucher.sequence = sequence.max(0) as u64;

        insert_entries(&mut tx, &voucher).await?;
        tx.commit().await.map_err(ledger_db_error)?;

        info!(
            voucher_id = %voucher.id,
            sequence = voucher.sequence,
            total = %totals.debits,
            "Voucher posted"
        );
        Ok(voucher)
    }

    #[instrument(skip(self, draft, chart, policy))]
    async fn replace(
        &self,
        id: VoucherId,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(ledger_db_error)?;
        lock_xact(&mut tx, JOURNAL_LOCK_KEY).await.map_err(ledger_db_error)?;

        let mut voucher = fetch_voucher(&mut tx, id, true).await?;
        policy.check_date(voucher.date)?;
        validate_draft(&draft, chart, policy)?;
        recheck_accounts(&mut tx, &draft).await?;
        voucher.apply(draft);

        sqlx::query(
            "UPDATE vouchers SET voucher_date = $2, narration = $3, voucher_type = $4, \
             reversal_of = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(Uuid::from(voucher.id))
        .bind(voucher.date)
        .bind(&voucher.narration)
        .bind(voucher.voucher_type.code())
        .bind(voucher.reversal_of.map(Uuid::from))
        .bind(voucher.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(ledger_db_error)?;

        sqlx::query("DELETE FROM voucher_entries WHERE voucher_id = $1")
            .bind(Uuid::from(voucher.id))
            .execute(&mut *tx)
            .await
            .map_err(ledger_db_error)?;
        insert_entries(&mut tx, &voucher).await?;

        tx.commit().await.map_err(ledger_db_error)?;
        info!("Voucher replaced");
        Ok(voucher)
    }

    #[instrument(skip(self, policy))]
    async fn delete(&self, id: VoucherId, policy: &PostingPolicy) -> Result<Voucher, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(ledger_db_error)?;
        lock_xact(&mut tx, JOURNAL_LOCK_KEY).await.map_err(ledger_db_error)?;

        let voucher = fetch_voucher(&mut tx, id, true).await?;
        policy.check_date(voucher.date)?;

        sqlx::query("DELETE FROM vouchers WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&mut *tx)
            .await
            .map_err(ledger_db_error)?;

        tx.commit().await.map_err(ledger_db_error)?;
        info!("Voucher deleted");
        Ok(voucher)
    }

    async fn get(&self, id: VoucherId) -> Result<Voucher, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(ledger_db_error)?;
        fetch_voucher(&mut conn, id, false).await
    }

    async fn list_in_range(&self, window: DateWindow) -> Result<Vec<Voucher>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(ledger_db_error)?;

        let rows: Vec<VoucherRow> = sqlx::query_as(&format!(
            "SELECT {} FROM vouchers \
             WHERE ($1::date IS NULL OR voucher_date >= $1) AND ($2::date IS NULL OR voucher_date <= $2) \
             ORDER BY voucher_date, sequence",
            VOUCHER_COLUMNS
        ))
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&mut *conn)
        .await
        .map_err(ledger_db_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut entries = fetch_entries(&mut conn, &ids).await?;

        let vouchers = rows
            .into_iter()
            .map(|row| {
                let lines = entries.remove(&row.id).unwrap_or_default();
                row.into_voucher(lines)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = vouchers.len(), "Journal range read");
        Ok(vouchers)
    }

    async fn count(&self) -> Result<usize, LedgerError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vouchers")
            .fetch_one(&self.pool)
            .await
            .map_err(ledger_db_error)?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Money;
    use rust_decimal_macros::dec;

    fn entry_row(debit: Decimal, credit: Decimal) -> EntryRow {
        EntryRow {
            voucher_id: Uuid::new_v4(),
            ledger_id: Uuid::new_v4(),
            debit,
            credit,
            memo: Some("line".to_string()),
        }
    }

    #[test]
    fn test_entry_row_credit_column() {
        let entry = entry_row(dec!(0), dec!(75)).into_entry().unwrap();

        assert_eq!(entry.posting.signed(), Money::new(dec!(-75)));
        assert_eq!(entry.memo.as_deref(), Some("line"));
    }

    #[test]
    fn test_entry_row_with_both_columns_is_rejected() {
        let err = entry_row(dec!(10), dec!(10)).into_entry().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidEntry(_)));
    }

    #[test]
    fn test_voucher_row_rejects_unknown_type() {
        let now = Utc::now();
        let row = VoucherRow {
            id: Uuid::new_v4(),
            sequence: 3,
            voucher_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            narration: "Sale".to_string(),
            voucher_type: "barter".to_string(),
            reversal_of: None,
            created_at: now,
            updated_at: now,
        };

        assert!(matches!(row.into_voucher(Vec::new()), Err(LedgerError::Port(_))));
    }
}
