//! PostgreSQL Party Adapter
//!
//! Implements `PartyPort` over the `parties` table. The ledger binding is a
//! single conditional `UPDATE`, which gives the compare-and-set the binder
//! relies on without an explicit lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresPartyAdapter;
//! use domain_party::{PartyPort, PartyPortExt};
//! use std::sync::Arc;
//!
//! let port: Arc<dyn PartyPort> = Arc::new(PostgresPartyAdapter::new(pool));
//! let party = port.get_party(party_id, None).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, LedgerId, OperationMetadata, PartyId, PortError,
};
use domain_party::{Party, PartyKind, PartyPort};

use super::ping;
use crate::error::{port_db_error, DatabaseError};

#[derive(Debug, sqlx::FromRow)]
struct PartyRow {
    id: Uuid,
    name: String,
    kind: String,
    email: Option<String>,
    phone: Option<String>,
    coa_ledger_id: Option<Uuid>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PartyRow> for Party {
    type Error = DatabaseError;

    fn try_from(row: PartyRow) -> Result<Self, Self::Error> {
        let kind = PartyKind::from_code(&row.kind).ok_or_else(|| DatabaseError::bad_code("kind", &row.kind))?;
        Ok(Party {
            id: PartyId::from_uuid(row.id),
            name: row.name,
            kind,
            email: row.email,
            phone: row.phone,
            coa_ledger_id: row.coa_ledger_id.map(LedgerId::from_uuid),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PARTY_COLUMNS: &str =
    "id, name, kind, email, phone, coa_ledger_id, is_active, created_at, updated_at";

/// PostgreSQL-backed implementation of the PartyPort trait
///
/// Database errors are translated to `PortError` variants:
/// - missing rows -> `PortError::NotFound`
/// - unique violations and lost binding races -> `PortError::Conflict`
/// - other errors -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresPartyAdapter {
    pool: PgPool,
}

impl PostgresPartyAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresPartyAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPartyAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-party-adapter").await
    }
}

#[async_trait]
impl PartyPort for PostgresPartyAdapter {
    #[instrument(skip(self, metadata), fields(party_id = %id))]
    async fn get_party(
        &self,
        id: PartyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Party, PortError> {
        debug!(
            correlation_id = OperationMetadata::correlation_of(metadata.as_ref()),
            "Fetching party by ID"
        );

        let row: Option<PartyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parties WHERE id = $1",
            PARTY_COLUMNS
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(port_db_error)?;

        let row = row.ok_or_else(|| PortError::not_found("Party", id))?;
        Ok(row.try_into()?)
    }

    #[instrument(skip(self, party, _metadata), fields(party_id = %party.id))]
    async fn save_party(
        &self,
        party: &Party,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO parties (id, name, kind, email, phone, coa_ledger_id, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, kind = EXCLUDED.kind, email = EXCLUDED.email,
                phone = EXCLUDED.phone, coa_ledger_id = EXCLUDED.coa_ledger_id,
                is_active = EXCLUDED.is_active, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(Uuid::from(party.id))
        .bind(&party.name)
        .bind(party.kind.code())
        .bind(party.email.as_deref())
        .bind(party.phone.as_deref())
        .bind(party.coa_ledger_id.map(Uuid::from))
        .bind(party.is_active)
        .bind(party.created_at)
        .bind(party.updated_at)
        .execute(&self.pool)
        .await
        .map_err(port_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, _metadata), fields(party_id = %id, ledger_id = %ledger_id))]
    async fn bind_ledger(
        &self,
        id: PartyId,
        expected: Option<LedgerId>,
        ledger_id: LedgerId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Party, PortError> {
        let row: Option<PartyRow> = sqlx::query_as(&format!(
            "UPDATE parties SET coa_ledger_id = $3, updated_at = NOW() \
             WHERE id = $1 AND (coa_ledger_id IS NOT DISTINCT FROM $2 OR coa_ledger_id = $3) \
             RETURNING {}",
            PARTY_COLUMNS
        ))
        .bind(Uuid::from(id))
        .bind(expected.map(Uuid::from))
        .bind(Uuid::from(ledger_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(port_db_error)?;

        match row {
            Some(row) => Ok(row.try_into()?),
            None => {
                // Either the party is gone or another writer moved the binding
                let current = self.get_party(id, None).await?;
                warn!(current = ?current.coa_ledger_id, "Ledger binding lost a race");
                Err(PortError::conflict(format!(
                    "party {} is bound to {:?}, expected {:?}",
                    id, current.coa_ledger_id, expected
                )))
            }
        }
    }

    async fn list_parties(
        &self,
        active_only: bool,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Party>, PortError> {
        let rows: Vec<PartyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parties WHERE ($1 = FALSE OR is_active) ORDER BY name",
            PARTY_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(port_db_error)?;

        Ok(rows
            .into_iter()
            .map(Party::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
