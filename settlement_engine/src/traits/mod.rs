//! # Database backend contracts.
//!
//! This module defines the interface contract that settlement engine database *backends* must
//! expose.
//!
//! ## Settlement
//! The [`SettlementGatewayDatabase`] trait is the seam between the webhook-driven flow and the
//! store. It owns the two operations with real consistency obligations:
//!
//! * the settlement transaction — ledger gate, order merge-paid and per-line stock decrements in
//!   one atomic unit, and
//! * the stock-consistency pass — re-deriving a product's denormalized aggregate from its embedded
//!   variant list.
//!
//! It also carries the collaborator surfaces (order drafts, catalog CRUD) that feed those two
//! paths.
mod data_objects;
mod settlement_gateway_database;

pub use data_objects::{LineSettlement, SettlementOutcome};
pub use settlement_gateway_database::{SettlementGatewayDatabase, SettlementGatewayError};
