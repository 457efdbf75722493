use thiserror::Error;

use crate::{
    db_types::{EventId, NewOrder, Order, OrderId, PaymentLinkage, Product, ProductWrite},
    traits::SettlementOutcome,
};

/// This trait defines the behaviour that database backends must expose to support the settlement
/// engine.
///
/// This behaviour includes:
/// * The atomic settlement transaction for payment-completion notifications.
/// * The idempotency ledger keyed by processor event id.
/// * The corrective stock-consistency pass.
/// * Order draft and catalog collaborator surfaces.
#[allow(async_fn_in_trait)]
pub trait SettlementGatewayDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Fast-path check against the settlement ledger. `true` means the event id has already been
    /// applied and redelivery can be acknowledged without touching anything.
    ///
    /// This is an optimisation only. The authoritative gate is the conditional ledger insert
    /// inside [`Self::settle_order`], so two near-simultaneous redeliveries cannot both apply.
    async fn is_event_processed(&self, event_id: &EventId) -> Result<bool, SettlementGatewayError>;

    /// Apply a payment-completion notification to the order and its inventory, exactly once.
    ///
    /// In a single atomic transaction:
    /// * claims the ledger entry for `event_id` (create-if-absent). If the entry already exists,
    ///   returns [`SettlementOutcome::AlreadyProcessed`] with no side effects;
    /// * merges the payment linkage and `Paid` status into the order (fields not specified are
    ///   untouched; linkage is immutable once paid);
    /// * for every line item with a positive quantity and a non-empty product id, decrements the
    ///   matched variant's stock (floored at zero) and recomputes the product aggregate, or falls
    ///   back to decrementing the aggregate directly when no variant matches. Missing products are
    ///   skipped.
    ///
    /// Any error aborts the whole transaction, ledger entry included, so the processor's
    /// redelivery can safely re-run the settlement from scratch.
    async fn settle_order(
        &self,
        event_id: &EventId,
        event_type: &str,
        order_id: &OrderId,
        linkage: &PaymentLinkage,
    ) -> Result<SettlementOutcome, SettlementGatewayError>;

    /// Re-derive a product's aggregate stock from its embedded variant list and issue a corrective
    /// update when they differ. No-op when the product is missing, has no variants, or is already
    /// consistent.
    ///
    /// Returns the corrected aggregate when a write happened.
    async fn enforce_product_stock(&self, product_id: &str) -> Result<Option<i64>, SettlementGatewayError>;

    /// Store a new order draft written by the storefront at checkout start. Idempotent on the
    /// order id.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementGatewayError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementGatewayError>;

    /// All orders, newest first.
    async fn fetch_orders(&self) -> Result<Vec<Order>, SettlementGatewayError>;

    /// Fulfillment marks a paid order as ready for pickup or shipping.
    async fn mark_order_ready(&self, order_id: &OrderId) -> Result<Order, SettlementGatewayError>;

    /// Create a catalog product from the full-replace edit-form shape. An id is generated.
    async fn create_product(&self, product: ProductWrite) -> Result<Product, SettlementGatewayError>;

    /// Full-replace update of a catalog product. Returns `None` when the product does not exist.
    async fn update_product(&self, id: &str, product: ProductWrite)
        -> Result<Option<Product>, SettlementGatewayError>;

    /// Returns `true` when a row was actually deleted.
    async fn delete_product(&self, id: &str) -> Result<bool, SettlementGatewayError>;

    async fn fetch_product(&self, id: &str) -> Result<Option<Product>, SettlementGatewayError>;

    async fn fetch_products(&self) -> Result<Vec<Product>, SettlementGatewayError>;
}

#[derive(Debug, Error)]
pub enum SettlementGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Product {0} does not exist")]
    ProductNotFound(String),
    #[error("Could not serialize record. {0}")]
    SerializationError(String),
    #[error("Order {0} cannot be marked ready from status {1}")]
    OrderNotFulfillable(OrderId, String),
}

impl From<sqlx::Error> for SettlementGatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for SettlementGatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}
