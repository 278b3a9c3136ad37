//! PostgreSQL Chart Adapter
//!
//! Implements `ChartPort` over the `account_groups`, `ledgers`, and
//! `canonical_roles` tables. Hierarchy mutations reload the chart inside a
//! locked transaction and reuse the domain's own checks before writing.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use chrono::NaiveDate;
use core_kernel::{DomainPort, GroupId, HealthCheckResult, HealthCheckable, LedgerId, Money};
use domain_ledger::{
    CanonicalRole, ChartOfAccounts, ChartPort, DrCr, Group, Ledger, LedgerError, LedgerStatus,
    LedgerType, Nature, OpeningBalance,
};

use super::{lock_xact, ping, CHART_LOCK_KEY};
use crate::error::{ledger_db_error, DatabaseError};

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    nature: String,
    level: i32,
}

impl TryFrom<GroupRow> for Group {
    type Error = DatabaseError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        let nature =
            Nature::from_code(&row.nature).ok_or_else(|| DatabaseError::bad_code("nature", &row.nature))?;
        Ok(Group {
            id: GroupId::from_uuid(row.id),
            name: row.name,
            parent_id: row.parent_id.map(GroupId::from_uuid),
            nature,
            level: row.level.max(0) as u32,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    name: String,
    group_id: Uuid,
    nature: String,
    ledger_type: String,
    opening_amount: Decimal,
    opening_side: String,
    opening_as_of: NaiveDate,
    is_posting: bool,
    is_active: bool,
}

impl TryFrom<LedgerRow> for Ledger {
    type Error = DatabaseError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let nature =
            Nature::from_code(&row.nature).ok_or_else(|| DatabaseError::bad_code("nature", &row.nature))?;
        let ledger_type = LedgerType::from_code(&row.ledger_type)
            .ok_or_else(|| DatabaseError::bad_code("ledger_type", &row.ledger_type))?;
        let side = DrCr::from_code(&row.opening_side)
            .ok_or_else(|| DatabaseError::bad_code("opening_side", &row.opening_side))?;

        Ok(Ledger {
            id: LedgerId::from_uuid(row.id),
            name: row.name,
            group_id: GroupId::from_uuid(row.group_id),
            nature,
            ledger_type,
            opening_balance: OpeningBalance {
                amount: Money::new(row.opening_amount),
                side,
                as_of: row.opening_as_of,
            },
            is_posting: row.is_posting,
            status: if row.is_active {
                LedgerStatus::Active
            } else {
                LedgerStatus::Inactive
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    role: String,
    group_id: Uuid,
}

const GROUP_COLUMNS: &str = "id, name, parent_id, nature, level";
const LEDGER_COLUMNS: &str = "id, name, group_id, nature, ledger_type, opening_amount, \
     opening_side, opening_as_of, is_posting, is_active";

/// Rebuilds the chart from its tables
///
/// Groups are inserted once their parent is present, so a group moved under
/// a later sibling still loads.
async fn load_chart(conn: &mut PgConnection) -> Result<ChartOfAccounts, LedgerError> {
    let group_rows: Vec<GroupRow> = sqlx::query_as(&format!(
        "SELECT {} FROM account_groups ORDER BY position",
        GROUP_COLUMNS
    ))
    .fetch_all(&mut *conn)
    .await
    .map_err(ledger_db_error)?;

    let ledger_rows: Vec<LedgerRow> = sqlx::query_as(&format!(
        "SELECT {} FROM ledgers ORDER BY position",
        LEDGER_COLUMNS
    ))
    .fetch_all(&mut *conn)
    .await
    .map_err(ledger_db_error)?;

    let role_rows: Vec<RoleRow> = sqlx::query_as("SELECT role, group_id FROM canonical_roles")
        .fetch_all(&mut *conn)
        .await
        .map_err(ledger_db_error)?;

    let mut chart = ChartOfAccounts::new();
    let mut pending = group_rows
        .into_iter()
        .map(Group::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();
        for group in pending {
            let ready = match group.parent_id {
                Some(parent) => chart.get_group(parent).is_ok(),
                None => true,
            };
            if ready {
                chart.add_group(group)?;
            } else {
                deferred.push(group);
            }
        }
        if deferred.len() == before {
            // Remaining parents never resolve: the stored hierarchy loops
            return Err(LedgerError::CycleDetected(deferred[0].id));
        }
        pending = deferred;
    }

    for row in ledger_rows {
        chart.add_ledger(Ledger::try_from(row)?)?;
    }

    for row in role_rows {
        let role = CanonicalRole::from_code(&row.role)
            .ok_or_else(|| DatabaseError::bad_code("role", &row.role))?;
        chart.assign_role(role, GroupId::from_uuid(row.group_id))?;
    }

    debug!(
        groups = chart.group_count(),
        ledgers = chart.ledger_count(),
        "Chart loaded"
    );
    Ok(chart)
}

/// Maps a foreign-key failure on a ledger write to the missing group
fn ledger_write_error(error: sqlx::Error, group_id: GroupId) -> LedgerError {
    match DatabaseError::from(error) {
        DatabaseError::ForeignKeyViolation(_) => LedgerError::UnknownGroup(group_id),
        other => other.into(),
    }
}

/// PostgreSQL-backed chart of accounts
#[derive(Debug, Clone)]
pub struct PostgresChartStore {
    pool: PgPool,
}

impl PostgresChartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seeds an empty database with the given chart
    ///
    /// Does nothing if any group already exists.
    #[instrument(skip(self, chart))]
    pub async fn seed(&self, chart: &ChartOfAccounts) -> Result<bool, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(ledger_db_error)?;
        lock_xact(&mut tx, CHART_LOCK_KEY).await.map_err(ledger_db_error)?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account_groups")
            .fetch_one(&mut *tx)
            .await
            .map_err(ledger_db_error)?;
        if existing > 0 {
            return Ok(false);
        }

        for group in chart.groups() {
            insert_group_row(&mut tx, group).await?;
        }
        for ledger in chart.ledgers() {
            insert_ledger_row(&mut tx, ledger).await?;
        }
        for (role, group_id) in chart.roles() {
            upsert_role(&mut tx, role, group_id).await?;
        }

        tx.commit().await.map_err(ledger_db_error)?;
        info!(groups = chart.group_count(), ledgers = chart.ledger_count(), "Chart seeded");
        Ok(true)
    }
}

async fn insert_group_row(conn: &mut PgConnection, group: &Group) -> Result<(), LedgerError> {
    sqlx::query(
        "INSERT INTO account_groups (id, name, parent_id, nature, level) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::from(group.id))
    .bind(&group.name)
    .bind(group.parent_id.map(Uuid::from))
    .bind(group.nature.code())
    .bind(group.level as i32)
    .execute(conn)
    .await
    .map_err(ledger_db_error)?;
    Ok(())
}

/// Conditional insert, returning false if the id is taken
async fn insert_ledger_row(conn: &mut PgConnection, ledger: &Ledger) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
        INSERT INTO ledgers (id, name, group_id, nature, ledger_type, opening_amount,
                             opening_side, opening_as_of, is_posting, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::from(ledger.id))
    .bind(&ledger.name)
    .bind(Uuid::from(ledger.group_id))
    .bind(ledger.nature.code())
    .bind(ledger.ledger_type.code())
    .bind(ledger.opening_balance.amount.amount())
    .bind(ledger.opening_balance.side.code())
    .bind(ledger.opening_balance.as_of)
    .bind(ledger.is_posting)
    .bind(ledger.is_active())
    .execute(conn)
    .await
    .map_err(|e| ledger_write_error(e, ledger.group_id))?;

    Ok(result.rows_affected() == 1)
}

async fn upsert_role(
    conn: &mut PgConnection,
    role: CanonicalRole,
    group_id: GroupId,
) -> Result<(), LedgerError> {
    sqlx::query(
        "INSERT INTO canonical_roles (role, group_id) VALUES ($1, $2) \
         ON CONFLICT (role) DO UPDATE SET group_id = EXCLUDED.group_id",
    )
    .bind(role.code())
    .bind(Uuid::from(group_id))
    .execute(conn)
    .await
    .map_err(|e| match DatabaseError::from(e) {
        DatabaseError::ForeignKeyViolation(_) => LedgerError::UnknownGroup(group_id),
        other => other.into(),
    })?;
    Ok(())
}

impl DomainPort for PostgresChartStore {}

#[async_trait]
impl HealthCheckable for PostgresChartStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-chart-store").await
    }
}

#[async_trait]
impl ChartPort for PostgresChartStore {
    async fn snapshot(&self) -> Result<ChartOfAccounts, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(ledger_db_error)?;
        load_chart(&mut conn).await
    }

    async fn get_group(&self, id: GroupId) -> Result<Group, LedgerError> {
        let row: Option<GroupRow> = sqlx::query_as(&format!(
            "SELECT {} FROM account_groups WHERE id = $1",
            GROUP_COLUMNS
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(ledger_db_error)?;

        Ok(row.ok_or(LedgerError::UnknownGroup(id))?.try_into()?)
    }

    async fn get_ledger(&self, id: LedgerId) -> Result<Ledger, LedgerError> {
        let row: Option<LedgerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM ledgers WHERE id = $1",
            LEDGER_COLUMNS
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(ledger_db_error)?;

        Ok(row.ok_or(LedgerError::UnknownAccount(id))?.try_into()?)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, LedgerError> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!(
            "SELECT {} FROM account_groups ORDER BY position",
            GROUP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(ledger_db_error)?;

        Ok(rows
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_ledgers(&self) -> Result<Vec<Ledger>, LedgerError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM ledgers ORDER BY position",
            LEDGER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(ledger_db_error)?;

        Ok(rows
            .into_iter()
            .map(Ledger::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_ledger_by_name(&self, name: &str) -> Result<Option<Ledger>, LedgerError> {
        let row: Option<LedgerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM ledgers WHERE name = $1 ORDER BY position LIMIT 1",
            LEDGER_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(ledger_db_error)?;

        Ok(row.map(Ledger::try_from).transpose()?)
    }

    #[instrument(skip(self, group), fields(group_id = %group.id))]
    async fn insert_group(&self, group: Group) -> Result<Group, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(ledger_db_error)?;
        lock_xact(&mut tx, CHART_LOCK_KEY).await.map_err(ledger_db_error)?;

        let mut chart = load_chart(&mut tx).await?;
        let id = group.id;
        chart.add_group(group)?;
        let stored = chart.get_group(id)?.clone();

        insert_group_row(&mut tx, &stored).await?;
        tx.commit().await.map_err(ledger_db_error)?;

        info!(level = stored.level, "Group created");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn move_group(&self, id: GroupId, parent: Option<GroupId>) -> Result<Group, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(ledger_db_error)?;
        lock_xact(&mut tx, CHART_LOCK_KEY).await.map_err(ledger_db_error)?;

        let mut chart = load_chart(&mut tx).await?;
        chart.move_group(id, parent)?;

        sqlx::query("UPDATE account_groups SET parent_id = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(parent.map(Uuid::from))
            .execute(&mut *tx)
            .await
            .map_err(ledger_db_error)?;

        let mut subtree = Vec::new();
        for group in chart.groups() {
            if chart.is_within(group.id, id)? {
                subtree.push((group.id, group.level));
            }
        }
        for (group_id, level) in subtree {
            sqlx::query("UPDATE account_groups SET level = $2 WHERE id = $1")
                .bind(Uuid::from(group_id))
                .bind(level as i32)
                .execute(&mut *tx)
                .await
                .map_err(ledger_db_error)?;
        }

        tx.commit().await.map_err(ledger_db_error)?;
        info!("Group moved");
        Ok(chart.get_group(id)?.clone())
    }

    #[instrument(skip(self, ledger), fields(ledger_id = %ledger.id))]
    async fn insert_ledger(&self, ledger: Ledger) -> Result<Ledger, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(ledger_db_error)?;
        if !insert_ledger_row(&mut conn, &ledger).await? {
            return Err(LedgerError::DuplicateAccount(ledger.id.to_string()));
        }
        info!(name = %ledger.name, "Ledger created");
        Ok(ledger)
    }

    #[instrument(skip(self, ledger), fields(ledger_id = %ledger.id))]
    async fn update_ledger(&self, ledger: Ledger) -> Result<Ledger, LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE ledgers
            SET name = $2, group_id = $3, nature = $4, ledger_type = $5, opening_amount = $6,
                opening_side = $7, opening_as_of = $8, is_posting = $9, is_active = $10,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(ledger.id))
        .bind(&ledger.name)
        .bind(Uuid::from(ledger.group_id))
        .bind(ledger.nature.code())
        .bind(ledger.ledger_type.code())
        .bind(ledger.opening_balance.amount.amount())
        .bind(ledger.opening_balance.side.code())
        .bind(ledger.opening_balance.as_of)
        .bind(ledger.is_posting)
        .bind(ledger.is_active())
        .execute(&self.pool)
        .await
        .map_err(|e| ledger_write_error(e, ledger.group_id))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::UnknownAccount(ledger.id));
        }
        Ok(ledger)
    }

    async fn assign_role(&self, role: CanonicalRole, group_id: GroupId) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(ledger_db_error)?;
        upsert_role(&mut conn, role, group_id).await
    }

    async fn canonical_group(&self, role: CanonicalRole) -> Result<Group, LedgerError> {
        let row: Option<GroupRow> = sqlx::query_as(
            "SELECT g.id, g.name, g.parent_id, g.nature, g.level \
             FROM canonical_roles r JOIN account_groups g ON g.id = r.group_id \
             WHERE r.role = $1",
        )
        .bind(role.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(ledger_db_error)?;

        let row = row.ok_or_else(|| LedgerError::RoleNotAssigned(role.code().to_string()))?;
        Ok(row.try_into()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger_row(nature: &str, side: &str) -> LedgerRow {
        LedgerRow {
            id: Uuid::new_v4(),
            name: "Cash".to_string(),
            group_id: Uuid::new_v4(),
            nature: nature.to_string(),
            ledger_type: "cash".to_string(),
            opening_amount: dec!(250),
            opening_side: side.to_string(),
            opening_as_of: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            is_posting: true,
            is_active: false,
        }
    }

    #[test]
    fn test_ledger_row_maps_opening_and_status() {
        let ledger = Ledger::try_from(ledger_row("asset", "cr")).unwrap();

        assert_eq!(ledger.opening_balance.signed(), Money::new(dec!(-250)));
        assert_eq!(ledger.status, LedgerStatus::Inactive);
        assert_eq!(ledger.ledger_type, LedgerType::Cash);
    }

    #[test]
    fn test_unknown_nature_code_is_corrupt_row() {
        let err = Ledger::try_from(ledger_row("capital", "dr")).unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptRow(_)));
    }

    #[test]
    fn test_group_row_mapping() {
        let parent = Uuid::new_v4();
        let group = Group::try_from(GroupRow {
            id: Uuid::new_v4(),
            name: "Current Assets".to_string(),
            parent_id: Some(parent),
            nature: "asset".to_string(),
            level: 1,
        })
        .unwrap();

        assert_eq!(group.parent_id, Some(GroupId::from_uuid(parent)));
        assert_eq!(group.level, 1);
        assert!(!group.is_root());
    }
}
