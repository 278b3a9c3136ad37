//! Party to ledger binding
//!
//! Every customer and supplier has exactly one ledger recording its
//! balance. The binder finds that ledger, adopting a legacy ledger of the
//! same name or creating one under the trade receivables or payables group
//! when none exists.
//!
//! Creation is idempotent: a party's ledger id is derived from the party id,
//! so concurrent resolvers race on one conditional insert and at most one
//! ledger ever exists per party.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{LedgerId, PartyId, PortError};
use domain_party::{Party, PartyPort};

use crate::chart::{CanonicalRole, Ledger, LedgerType};
use crate::error::LedgerError;
use crate::ports::ChartPort;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Resolves the ledger for a party, creating it on first use
pub struct PartyLedgerBinder {
    chart: Arc<dyn ChartPort>,
    parties: Arc<dyn PartyPort>,
    max_attempts: u32,
}

impl PartyLedgerBinder {
    pub fn new(chart: Arc<dyn ChartPort>, parties: Arc<dyn PartyPort>) -> Self {
        Self {
            chart,
            parties,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Returns the party's ledger
    ///
    /// 1. The bound ledger, if the binding resolves.
    /// 2. Otherwise any ledger with the party's exact name, whatever its type.
    /// 3. Otherwise a new ledger under the canonical group for the party kind.
    ///
    /// Steps 2 and 3 finish by binding the party with compare-and-set. A
    /// lost race re-reads the party and starts over.
    ///
    /// # Errors
    ///
    /// - `Port(NotFound)` if the party does not exist
    /// - `RoleNotAssigned` if the chart lacks the canonical group
    /// - `Port(Conflict)` if every attempt lost a race
    #[instrument(skip(self))]
    pub async fn resolve_ledger_for(&self, party_id: PartyId) -> Result<Ledger, LedgerError> {
        for attempt in 1..=self.max_attempts {
            let party = self.parties.get_party(party_id, None).await?;
            match self.try_resolve(&party).await {
                Err(LedgerError::Port(e)) if e.is_conflict() => {
                    debug!(attempt, "Lost party binding race, retrying");
                }
                result => return result,
            }
        }

        Err(LedgerError::Port(PortError::conflict(format!(
            "could not bind a ledger for {} after {} attempts",
            party_id, self.max_attempts
        ))))
    }

    async fn try_resolve(&self, party: &Party) -> Result<Ledger, LedgerError> {
        if let Some(bound) = party.coa_ledger_id {
            match self.chart.get_ledger(bound).await {
                Ok(ledger) => return Ok(ledger),
                Err(LedgerError::UnknownAccount(_)) => {
                    warn!(ledger_id = %bound, "Party bound to a missing ledger, rebinding");
                }
                Err(e) => return Err(e),
            }
        }

        let ledger = match self.chart.find_ledger_by_name(&party.name).await? {
            Some(existing) => {
                debug!(
                    ledger_id = %existing.id,
                    ledger_type = ?existing.ledger_type,
                    "Adopting existing ledger by name"
                );
                existing
            }
            None => self.create_ledger(party).await?,
        };

        self.parties
            .bind_ledger(party.id, party.coa_ledger_id, ledger.id, None)
            .await?;
        Ok(ledger)
    }

    async fn create_ledger(&self, party: &Party) -> Result<Ledger, LedgerError> {
        let (role, ledger_type) = if party.kind.is_customer() {
            (CanonicalRole::TradeReceivables, LedgerType::Receivable)
        } else {
            (CanonicalRole::TradePayables, LedgerType::Payable)
        };

        let group = self.chart.canonical_group(role).await?;
        let id = LedgerId::for_party(party.id);
        let ledger = Ledger::new(party.name.clone(), &group, ledger_type).with_id(id);

        match self.chart.insert_ledger(ledger).await {
            Ok(created) => {
                info!(ledger_id = %created.id, group = %group.name, "Created party ledger");
                Ok(created)
            }
            // another resolver created it first
            Err(LedgerError::DuplicateAccount(_)) => self.chart.get_ledger(id).await,
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::StandardChart;
    use crate::ports::InMemoryChartStore;
    use domain_party::{InMemoryPartyPort, PartyKind};

    async fn setup(parties: Vec<Party>) -> (Arc<InMemoryChartStore>, Arc<InMemoryPartyPort>) {
        let chart = Arc::new(InMemoryChartStore::new(StandardChart::create().unwrap()));
        let party_port = Arc::new(InMemoryPartyPort::with_parties(parties).await);
        (chart, party_port)
    }

    #[tokio::test]
    async fn test_creates_ledger_under_trade_receivables() {
        let customer = Party::new("Acme Retail", PartyKind::Customer);
        let (chart, parties) = setup(vec![customer.clone()]).await;
        let binder = PartyLedgerBinder::new(chart.clone(), parties.clone());

        let ledger = binder.resolve_ledger_for(customer.id).await.unwrap();
        assert_eq!(ledger.id, LedgerId::for_party(customer.id));
        assert_eq!(ledger.ledger_type, LedgerType::Receivable);

        let receivables = chart.canonical_group(CanonicalRole::TradeReceivables).await.unwrap();
        assert_eq!(ledger.group_id, receivables.id);

        let stored = parties.get_party(customer.id, None).await.unwrap();
        assert_eq!(stored.coa_ledger_id, Some(ledger.id));
    }

    #[tokio::test]
    async fn test_second_resolve_returns_bound_ledger() {
        let supplier = Party::new("Widgets Ltd", PartyKind::Supplier);
        let (chart, parties) = setup(vec![supplier.clone()]).await;
        let binder = PartyLedgerBinder::new(chart.clone(), parties);

        let first = binder.resolve_ledger_for(supplier.id).await.unwrap();
        let second = binder.resolve_ledger_for(supplier.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.ledger_type, LedgerType::Payable);
    }

    #[tokio::test]
    async fn test_adopts_legacy_ledger_by_name() {
        let customer = Party::new("Old Customer", PartyKind::Customer);
        let (chart, parties) = setup(vec![customer.clone()]).await;
        let group = chart.canonical_group(CanonicalRole::TradeReceivables).await.unwrap();
        let legacy = chart
            .insert_ledger(Ledger::new("Old Customer", &group, LedgerType::Receivable))
            .await
            .unwrap();

        let binder = PartyLedgerBinder::new(chart, parties);
        let resolved = binder.resolve_ledger_for(customer.id).await.unwrap();
        assert_eq!(resolved.id, legacy.id);
    }

    #[tokio::test]
    async fn test_adopts_hand_made_general_ledger() {
        let customer = Party::new("Acme Legacy", PartyKind::Customer);
        let (chart, parties) = setup(vec![customer.clone()]).await;
        let group = chart.canonical_group(CanonicalRole::TradeReceivables).await.unwrap();
        let legacy = chart
            .insert_ledger(Ledger::new("Acme Legacy", &group, LedgerType::General))
            .await
            .unwrap();

        let binder = PartyLedgerBinder::new(chart.clone(), parties.clone());
        let resolved = binder.resolve_ledger_for(customer.id).await.unwrap();
        assert_eq!(resolved.id, legacy.id);

        let same_name = chart
            .list_ledgers()
            .await
            .unwrap()
            .into_iter()
            .filter(|l| l.name == "Acme Legacy")
            .count();
        assert_eq!(same_name, 1);
        assert_eq!(
            parties.get_party(customer.id, None).await.unwrap().coa_ledger_id,
            Some(legacy.id)
        );
    }

    #[tokio::test]
    async fn test_rebinds_dangling_reference() {
        let mut customer = Party::new("Drifted", PartyKind::Customer);
        customer.coa_ledger_id = Some(LedgerId::new());
        let (chart, parties) = setup(vec![customer.clone()]).await;

        let binder = PartyLedgerBinder::new(chart, parties.clone());
        let ledger = binder.resolve_ledger_for(customer.id).await.unwrap();

        let stored = parties.get_party(customer.id, None).await.unwrap();
        assert_eq!(stored.coa_ledger_id, Some(ledger.id));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let customer = Party::new("Single Shot", PartyKind::Customer);
        let (chart, parties) = setup(vec![customer.clone()]).await;
        let binder = PartyLedgerBinder::new(chart, parties).with_max_attempts(0);

        let ledger = binder.resolve_ledger_for(customer.id).await.unwrap();
        assert_eq!(ledger.id, LedgerId::for_party(customer.id));
    }

    #[tokio::test]
    async fn test_unknown_party() {
        let (chart, parties) = setup(vec![]).await;
        let binder = PartyLedgerBinder::new(chart, parties);
        let result = binder.resolve_ledger_for(PartyId::new()).await;
        assert!(matches!(result, Err(LedgerError::Port(e)) if e.is_not_found()));
    }
}
