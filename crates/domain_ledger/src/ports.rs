//! Ledger Domain Ports
//!
//! Port traits for chart and journal storage, with in-memory adapters used
//! by the API's memory mode and by tests. Postgres adapters live in
//! `infra_db`.
//!
//! # Usage
//!
//! ```rust,ignore
//! let chart: Arc<dyn ChartPort> = Arc::new(InMemoryChartStore::new(StandardChart::create()?));
//! let journal: Arc<dyn JournalPort> = Arc::new(InMemoryJournalStore::new());
//!
//! let snapshot = chart.snapshot().await?;
//! let voucher = journal.append(draft, &snapshot, &PostingPolicy::open()).await?;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, DateWindow, DomainPort, GroupId, HealthCheckResult, HealthCheckable, LedgerId,
    VoucherId,
};

use crate::chart::{CanonicalRole, ChartOfAccounts, Group, Ledger};
use crate::error::LedgerError;
use crate::journal::{JournalLog, PostingPolicy};
use crate::voucher::{Voucher, VoucherDraft};

/// Chart of accounts storage
#[async_trait]
pub trait ChartPort: DomainPort + HealthCheckable {
    /// A consistent copy of the whole chart
    async fn snapshot(&self) -> Result<ChartOfAccounts, LedgerError>;

    async fn get_group(&self, id: GroupId) -> Result<Group, LedgerError>;

    async fn get_ledger(&self, id: LedgerId) -> Result<Ledger, LedgerError>;

    async fn list_groups(&self) -> Result<Vec<Group>, LedgerError>;

    async fn list_ledgers(&self) -> Result<Vec<Ledger>, LedgerError>;

    /// Exact-name lookup
    async fn find_ledger_by_name(&self, name: &str) -> Result<Option<Ledger>, LedgerError>;

    /// Adds a group; the parent must exist and the hierarchy stay acyclic
    async fn insert_group(&self, group: Group) -> Result<Group, LedgerError>;

    /// Re-parents a group
    async fn move_group(&self, id: GroupId, parent: Option<GroupId>) -> Result<Group, LedgerError>;

    /// Conditional create
    ///
    /// Fails with `DuplicateAccount` if a ledger with the same id exists, so
    /// concurrent creators of a deterministic id see exactly one winner.
    async fn insert_ledger(&self, ledger: Ledger) -> Result<Ledger, LedgerError>;

    async fn update_ledger(&self, ledger: Ledger) -> Result<Ledger, LedgerError>;

    async fn assign_role(&self, role: CanonicalRole, group_id: GroupId) -> Result<(), LedgerError>;

    /// The group holding a role, `RoleNotAssigned` if none does
    async fn canonical_group(&self, role: CanonicalRole) -> Result<Group, LedgerError>;
}

/// Journal storage
///
/// Implementations validate and commit as one critical section: a write
/// either lands whole after passing `validate_draft` or not at all.
#[async_trait]
pub trait JournalPort: DomainPort + HealthCheckable {
    async fn append(
        &self,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError>;

    async fn replace(
        &self,
        id: VoucherId,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError>;

    async fn delete(&self, id: VoucherId, policy: &PostingPolicy) -> Result<Voucher, LedgerError>;

    async fn get(&self, id: VoucherId) -> Result<Voucher, LedgerError>;

    /// Vouchers in the window ordered by date, then insertion
    async fn list_in_range(&self, window: DateWindow) -> Result<Vec<Voucher>, LedgerError>;

    async fn count(&self) -> Result<usize, LedgerError>;
}

fn memory_health(adapter_id: &str) -> HealthCheckResult {
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status: AdapterHealth::Healthy,
        latency_ms: 0,
        message: Some("In-memory adapter always healthy".to_string()),
        checked_at: Utc::now(),
    }
}

/// In-memory chart
#[derive(Debug, Default)]
pub struct InMemoryChartStore {
    chart: RwLock<ChartOfAccounts>,
}

impl InMemoryChartStore {
    pub fn new(chart: ChartOfAccounts) -> Self {
        Self {
            chart: RwLock::new(chart),
        }
    }
}

impl DomainPort for InMemoryChartStore {}

#[async_trait]
impl HealthCheckable for InMemoryChartStore {
    async fn health_check(&self) -> HealthCheckResult {
        memory_health("memory-chart-store")
    }
}

#[async_trait]
impl ChartPort for InMemoryChartStore {
    async fn snapshot(&self) -> Result<ChartOfAccounts, LedgerError> {
        Ok(self.chart.read().await.clone())
    }

    async fn get_group(&self, id: GroupId) -> Result<Group, LedgerError> {
        self.chart.read().await.get_group(id).cloned()
    }

    async fn get_ledger(&self, id: LedgerId) -> Result<Ledger, LedgerError> {
        self.chart.read().await.get_ledger(id).cloned()
    }

    async fn list_groups(&self) -> Result<Vec<Group>, LedgerError> {
        Ok(self.chart.read().await.groups().cloned().collect())
    }

    async fn list_ledgers(&self) -> Result<Vec<Ledger>, LedgerError> {
        Ok(self.chart.read().await.ledgers().cloned().collect())
    }

    async fn find_ledger_by_name(&self, name: &str) -> Result<Option<Ledger>, LedgerError> {
        Ok(self.chart.read().await.find_by_name(name).cloned())
    }

    async fn insert_group(&self, group: Group) -> Result<Group, LedgerError> {
        let mut chart = self.chart.write().await;
        let id = group.id;
        chart.add_group(group)?;
        chart.get_group(id).cloned()
    }

    async fn move_group(&self, id: GroupId, parent: Option<GroupId>) -> Result<Group, LedgerError> {
        let mut chart = self.chart.write().await;
        chart.move_group(id, parent)?;
        chart.get_group(id).cloned()
    }

    async fn insert_ledger(&self, ledger: Ledger) -> Result<Ledger, LedgerError> {
        let mut chart = self.chart.write().await;
        chart.add_ledger(ledger.clone())?;
        Ok(ledger)
    }

    async fn update_ledger(&self, ledger: Ledger) -> Result<Ledger, LedgerError> {
        self.chart.write().await.update_ledger(ledger.clone())?;
        Ok(ledger)
    }

    async fn assign_role(&self, role: CanonicalRole, group_id: GroupId) -> Result<(), LedgerError> {
        self.chart.write().await.assign_role(role, group_id)
    }

    async fn canonical_group(&self, role: CanonicalRole) -> Result<Group, LedgerError> {
        self.chart.read().await.canonical_group(role).cloned()
    }
}

/// In-memory journal
///
/// The write lock spans validation and commit.
#[derive(Debug, Default)]
pub struct InMemoryJournalStore {
    log: RwLock<JournalLog>,
}

impl InMemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryJournalStore {}

#[async_trait]
impl HealthCheckable for InMemoryJournalStore {
    async fn health_check(&self) -> HealthCheckResult {
        memory_health("memory-journal-store")
    }
}

#[async_trait]
impl JournalPort for InMemoryJournalStore {
    async fn append(
        &self,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        self.log.write().await.append(draft, chart, policy)
    }

    async fn replace(
        &self,
        id: VoucherId,
        draft: VoucherDraft,
        chart: &ChartOfAccounts,
        policy: &PostingPolicy,
    ) -> Result<Voucher, LedgerError> {
        self.log.write().await.replace(id, draft, chart, policy)
    }

    async fn delete(&self, id: VoucherId, policy: &PostingPolicy) -> Result<Voucher, LedgerError> {
        self.log.write().await.delete(id, policy)
    }

    async fn get(&self, id: VoucherId) -> Result<Voucher, LedgerError> {
        self.log
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(LedgerError::VoucherNotFound(id))
    }

    async fn list_in_range(&self, window: DateWindow) -> Result<Vec<Voucher>, LedgerError> {
        Ok(self.log.read().await.list_in_range(&window))
    }

    async fn count(&self) -> Result<usize, LedgerError> {
        Ok(self.log.read().await.len())
    }
}
