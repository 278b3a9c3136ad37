//! Port plumbing shared by every storage seam
//!
//! The chart, journal, order and party stores are each reached through a
//! trait defined in the owning domain crate. Those traits extend
//! [`DomainPort`] and [`HealthCheckable`] from here and report failures as
//! [`PortError`], so the service layer and the HTTP surface can treat an
//! in-memory store and a PostgreSQL adapter the same way.

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Failure reported by a store, whatever backs it
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The store refused a write whose content is invalid
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A conditional write lost against the record's current state
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    /// A read did not finish within the configured deadline
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// A collaborator the operation needs is not wired in
    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// A stored record could not be turned back into a domain value
    #[error("Corrupt record: {message}")]
    Corrupt { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        PortError::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    pub fn unavailable(service: impl Into<String>) -> Self {
        PortError::ServiceUnavailable {
            service: service.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
        }
    }

    /// True when retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker for store traits; every store is shared across request tasks
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Answering, but slower than expected
    Degraded,
    Unhealthy,
}

impl AdapterHealth {
    /// Whether the store can serve requests
    pub fn is_serving(self) -> bool {
        !matches!(self, AdapterHealth::Unhealthy)
    }
}

/// Outcome of probing one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

/// Request context carried into store calls for log correlation
#[derive(Debug, Clone, Default)]
pub struct OperationMetadata {
    pub correlation_id: Option<String>,
}

impl OperationMetadata {
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(correlation_id.into()),
        }
    }

    /// Correlation id of optional metadata, for log fields
    pub fn correlation_of(metadata: Option<&Self>) -> Option<&str> {
        metadata.and_then(|m| m.correlation_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_entity_and_id() {
        let error = PortError::not_found("Ledger", "123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "Not found: Ledger with id 123");
    }

    #[test]
    fn test_only_infrastructure_failures_are_transient() {
        assert!(PortError::timeout("journal read", 5000).is_transient());
        assert!(PortError::unavailable("orders").is_transient());

        let conflict = PortError::conflict("binding moved");
        assert!(conflict.is_conflict());
        assert!(!conflict.is_transient());
        assert!(!PortError::validation("empty narration").is_transient());
    }

    #[test]
    fn test_degraded_store_still_serves() {
        assert!(AdapterHealth::Degraded.is_serving());
        assert!(!AdapterHealth::Unhealthy.is_serving());
    }

    #[test]
    fn test_correlation_lookup() {
        let metadata = OperationMetadata::with_correlation_id("req-123");
        assert_eq!(OperationMetadata::correlation_of(Some(&metadata)), Some("req-123"));
        assert_eq!(OperationMetadata::correlation_of(None), None);
    }
}
