//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`SettlementGatewayDatabase`]
//! trait. The per-product read-modify-write cycles all run inside sqlx transactions, which is what
//! makes concurrent settlements and catalog edits against the same product serializable.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::db::{create_schema, ledger, new_pool, orders, products};
use crate::{
    db_types::{EventId, NewOrder, Order, OrderId, OrderStatusType, PaymentLinkage, Product, ProductWrite},
    helpers::{aggregate_stock, resolve_variant, variant_stock, VariantMatch},
    traits::{LineSettlement, SettlementGatewayDatabase, SettlementGatewayError, SettlementOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SettlementGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        create_schema(&pool).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SettlementGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn is_event_processed(&self, event_id: &EventId) -> Result<bool, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let processed = ledger::is_processed(event_id, &mut conn).await?;
        Ok(processed)
    }

    /// The settlement transaction. In a single atomic unit:
    /// * claim the ledger entry for the event id (the real idempotency gate),
    /// * merge the payment linkage and `Paid` status into the order,
    /// * decrement stock for every resolvable line item.
    ///
    /// Any failure rolls the whole thing back, ledger entry included, so the processor's
    /// redelivery re-runs the settlement from a clean slate.
    async fn settle_order(
        &self,
        event_id: &EventId,
        event_type: &str,
        order_id: &OrderId,
        linkage: &PaymentLinkage,
    ) -> Result<SettlementOutcome, SettlementGatewayError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let newly_claimed = ledger::mark_processed_if_absent(event_id, event_type, now, &mut tx).await?;
        if !newly_claimed {
            debug!("🗃️ Event {event_id} is already in the settlement ledger. Absorbing the redelivery.");
            tx.rollback().await?;
            return Ok(SettlementOutcome::AlreadyProcessed);
        }
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| SettlementGatewayError::OrderNotFound(order_id.clone()))?;
        let order = orders::mark_order_paid(&order, linkage, now, &mut tx).await?;
        debug!("🗃️ Order {} marked as paid against session {}", order.id, linkage.session_id);

        let mut lines = Vec::with_capacity(order.items.len());
        let mut skipped = Vec::new();
        for item in order.items.iter() {
            let qty = item.quantity.max(0);
            let product_id = item.id.trim();
            if qty == 0 || product_id.is_empty() {
                continue;
            }
            let product = match products::fetch_product(product_id, &mut tx).await? {
                Some(p) => p,
                None => {
                    // The product may have been deleted after the order was created. Tolerated.
                    debug!("🗃️ Product {product_id} on order {} no longer exists. Skipping.", order.id);
                    skipped.push(product_id.to_string());
                    continue;
                },
            };
            let mut variants = product.variants.0.clone();
            let (resolved_variant, stock_after) = if variants.is_empty() {
                let stock = (product.stock.max(0) - qty).max(0);
                products::update_product_aggregate(&product.id, stock, now, &mut tx).await?;
                (None, stock)
            } else {
                match resolve_variant(&variants, item) {
                    VariantMatch::Resolved(idx) => {
                        let current = variant_stock(&variants[idx]);
                        variants[idx].stock = Some((current - qty).max(0));
                        let sum = aggregate_stock(&variants);
                        products::update_product_inventory(&product.id, &variants, sum, now, &mut tx).await?;
                        (Some(idx), sum)
                    },
                    VariantMatch::Unresolved => {
                        // No finer-grained data available for this line item; adjust the
                        // product-level aggregate and leave the variant array alone.
                        warn!(
                            "🗃️ No variant on product {} matches line item '{}' of order {}. Falling back to the \
                             aggregate stock.",
                            product.id, item.name, order.id
                        );
                        let stock = (product.stock.max(0) - qty).max(0);
                        products::update_product_aggregate(&product.id, stock, now, &mut tx).await?;
                        (None, stock)
                    },
                }
            };
            trace!("🗃️ Product {} stock is now {stock_after} after settling {qty} units", product.id);
            lines.push(LineSettlement { product_id: product.id.clone(), quantity: qty, resolved_variant, stock_after });
        }
        tx.commit().await?;
        debug!("🗃️ Settlement for event {event_id} committed. {} line items applied.", lines.len());
        Ok(SettlementOutcome::Applied { order, lines, skipped })
    }

    async fn enforce_product_stock(&self, product_id: &str) -> Result<Option<i64>, SettlementGatewayError> {
        let mut tx = self.pool.begin().await?;
        let product = match products::fetch_product(product_id, &mut tx).await? {
            Some(p) => p,
            None => return Ok(None),
        };
        if product.variants.is_empty() {
            // The aggregate is authoritative for variant-less products.
            return Ok(None);
        }
        let sum = aggregate_stock(&product.variants);
        if product.stock == sum {
            return Ok(None);
        }
        products::update_product_aggregate(product_id, sum, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Product {product_id} aggregate stock corrected from {} to {sum}", product.stock);
        Ok(Some(sum))
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementGatewayError> {
        let mut tx = self.pool.begin().await?;
        let (order, inserted) = orders::idempotent_insert(order, &mut tx).await?;
        if !inserted {
            debug!("🗃️ Order {} already exists. Returning the stored draft.", order.id);
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders(&mut conn).await?;
        Ok(orders)
    }

    async fn mark_order_ready(&self, order_id: &OrderId) -> Result<Order, SettlementGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| SettlementGatewayError::OrderNotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Paid {
            return Err(SettlementGatewayError::OrderNotFulfillable(order_id.clone(), order.status.to_string()));
        }
        let order = orders::update_order_status(order_id, OrderStatusType::Ready, &mut tx)
            .await?
            .ok_or_else(|| SettlementGatewayError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        Ok(order)
    }

    async fn create_product(&self, product: ProductWrite) -> Result<Product, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let id = products::new_product_id();
        let product = products::insert_product(&id, product, Utc::now(), &mut conn).await?;
        debug!("🗃️ Product {} created", product.id);
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &str,
        product: ProductWrite,
    ) -> Result<Option<Product>, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::update_product(id, product, Utc::now(), &mut conn).await?;
        Ok(product)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = products::delete_product(id, &mut conn).await?;
        Ok(deleted)
    }

    async fn fetch_product(&self, id: &str) -> Result<Option<Product>, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(&mut conn).await?;
        Ok(products)
    }
}
