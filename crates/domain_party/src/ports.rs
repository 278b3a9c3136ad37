//! Party Domain Ports
//!
//! This module defines the port interface for the party domain, enabling
//! swappable implementations (in-memory, PostgreSQL).
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_party::ports::PartyPort;
//! use std::sync::Arc;
//!
//! let parties: Arc<dyn PartyPort> = Arc::new(InMemoryPartyPort::new());
//! let party = parties.get_party(id, None).await?;
//! ```

use async_trait::async_trait;
use chrono::Utc;

use core_kernel::{
    LedgerId, PartyId, PortError, DomainPort, OperationMetadata,
    HealthCheckable, HealthCheckResult, AdapterHealth,
};

use crate::party::Party;

/// The port trait for party persistence
///
/// All methods are async and return `Result<T, PortError>` for consistent
/// error handling across different adapter implementations.
#[async_trait]
pub trait PartyPort: DomainPort + HealthCheckable {
    /// Retrieves a party by ID
    ///
    /// # Returns
    ///
    /// The party if found, or `PortError::NotFound`
    async fn get_party(
        &self,
        id: PartyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Party, PortError>;

    /// Inserts or replaces a party record
    async fn save_party(
        &self,
        party: &Party,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Binds a party to a ledger with compare-and-set semantics
    ///
    /// Succeeds when the party's current binding equals `expected` or is
    /// already `ledger_id`, and returns the party as stored afterwards.
    /// Fails with `PortError::Conflict` when another writer got there first.
    async fn bind_ledger(
        &self,
        id: PartyId,
        expected: Option<LedgerId>,
        ledger_id: LedgerId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Party, PortError>;

    /// Lists parties, optionally only active ones
    async fn list_parties(
        &self,
        active_only: bool,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Party>, PortError>;
}

/// Extension trait for PartyPort with convenience methods
#[async_trait]
pub trait PartyPortExt: PartyPort {
    /// Looks up a party, mapping `NotFound` to `None`
    async fn find_party(
        &self,
        id: PartyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Party>, PortError> {
        match self.get_party(id, metadata).await {
            Ok(party) => Ok(Some(party)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Validates and stores a new party
    async fn create_party(
        &self,
        party: Party,
        metadata: Option<OperationMetadata>,
    ) -> Result<Party, PortError> {
        party.validate_fields()?;
        self.save_party(&party, metadata).await?;
        Ok(party)
    }
}

// Blanket implementation for all PartyPort implementors
impl<T: PartyPort + ?Sized> PartyPortExt for T {}

/// In-memory implementation of PartyPort
///
/// Backs the API's memory storage mode and the test suites. The write lock
/// makes `bind_ledger` a single compare-and-set step.
#[derive(Debug, Default)]
pub struct InMemoryPartyPort {
    parties: tokio::sync::RwLock<std::collections::HashMap<PartyId, Party>>,
}

impl InMemoryPartyPort {
    /// Creates an empty port
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates with parties for testing
    pub async fn with_parties(parties: Vec<Party>) -> Self {
        let port = Self::new();
        {
            let mut guard = port.parties.write().await;
            for party in parties {
                guard.insert(party.id, party);
            }
        }
        port
    }
}

impl DomainPort for InMemoryPartyPort {}

#[async_trait]
impl HealthCheckable for InMemoryPartyPort {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-party-port".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory adapter always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PartyPort for InMemoryPartyPort {
    async fn get_party(
        &self,
        id: PartyId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Party, PortError> {
        self.parties
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Party", id))
    }

    async fn save_party(
        &self,
        party: &Party,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.parties.write().await.insert(party.id, party.clone());
        Ok(())
    }

    async fn bind_ledger(
        &self,
        id: PartyId,
        expected: Option<LedgerId>,
        ledger_id: LedgerId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Party, PortError> {
        let mut parties = self.parties.write().await;
        let party = parties
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Party", id))?;

        party.bind_ledger(expected, ledger_id)?;

        Ok(party.clone())
    }

    async fn list_parties(
        &self,
        active_only: bool,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Party>, PortError> {
        let parties = self.parties.read().await;
        let mut result: Vec<Party> = parties
            .values()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}
