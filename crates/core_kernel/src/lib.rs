//! Core Kernel - Foundational types and utilities for the ledger engine
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Date windows for cumulative and period queries
//! - Common identifiers and value objects
//! - Port abstractions shared by every adapter

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{default_tolerance, Money, MoneyError};
pub use temporal::{DateWindow, TemporalError};
pub use identifiers::{
    GroupId, LedgerId, VoucherId, PartyId, ProductId, OrderId,
};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
