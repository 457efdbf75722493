//! Storefront Settlement Engine
//!
//! The settlement engine contains the core logic for applying asynchronous payment-completion
//! notifications to orders and product inventory exactly once. It is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control. SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The
//!    exception is the data types used in the database. These are defined in the [`db_types`]
//!    module and are public.
//! 2. The engine public API ([`SettlementFlowApi`] and [`CatalogApi`]). Specific backends need to
//!    implement the [`SettlementGatewayDatabase`] trait in order to act as a backend for the
//!    settlement server.
//! 3. A set of events that can be subscribed to ([`mod@events`]). A simple handler framework lets
//!    you hook into product writes (the stock-consistency pass is wired this way) and order
//!    settlements.
mod api;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{db_url, SqliteDatabase};

pub use api::{CatalogApi, SettlementFlowApi};
pub use traits::{LineSettlement, SettlementGatewayDatabase, SettlementGatewayError, SettlementOutcome};
