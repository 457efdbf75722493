use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{EventId, NewOrder, Order, OrderId, PaymentLinkage},
    events::{EventProducers, OrderPaidEvent, ProductWrittenEvent},
    traits::{SettlementGatewayDatabase, SettlementGatewayError, SettlementOutcome},
};

/// `SettlementFlowApi` is the primary API for handling order and settlement flows in response to
/// storefront checkout events and payment-processor notifications.
pub struct SettlementFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SettlementFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementFlowApi")
    }
}

impl<B> SettlementFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> SettlementFlowApi<B>
where B: SettlementGatewayDatabase
{
    /// Apply a `checkout completed` notification to its order, exactly once.
    ///
    /// The ledger is consulted first as a fast path: a known event id is acknowledged without
    /// touching the database further. Otherwise the backend runs the settlement transaction, whose
    /// conditional ledger insert is the authoritative gate — a redelivery racing past the fast
    /// path still cannot double-apply.
    ///
    /// On success, subscribers are notified: the order-paid hook fires once, and a product-written
    /// event fires for every product the settlement touched (keeping stock-consistency coverage
    /// identical to the catalog edit path).
    pub async fn process_checkout_completed(
        &self,
        event_id: &EventId,
        event_type: &str,
        order_id: &OrderId,
        linkage: &PaymentLinkage,
    ) -> Result<SettlementOutcome, SettlementGatewayError> {
        if self.db.is_event_processed(event_id).await? {
            info!("🔄️💰️ Event {event_id} has already been applied. Acknowledging without side effects.");
            return Ok(SettlementOutcome::AlreadyProcessed);
        }
        let outcome = self.db.settle_order(event_id, event_type, order_id, linkage).await?;
        match &outcome {
            SettlementOutcome::Applied { order, lines, skipped } => {
                info!("🔄️💰️ Order {} settled. {} line items applied to inventory.", order.id, lines.len());
                if !skipped.is_empty() {
                    warn!("🔄️💰️ {} line items referenced missing products: {}", skipped.len(), skipped.join(", "));
                }
                self.call_order_paid_hook(order, lines).await;
                for line in lines {
                    self.call_product_written_hook(&line.product_id).await;
                }
            },
            SettlementOutcome::AlreadyProcessed => {
                info!("🔄️💰️ Event {event_id} lost the ledger race to a concurrent delivery. No-op.");
            },
        }
        Ok(outcome)
    }

    /// Store the order draft the storefront writes at checkout start, before it requests a payment
    /// session. Idempotent on the order id.
    pub async fn create_order_draft(&self, order: NewOrder) -> Result<Order, SettlementGatewayError> {
        debug!("🔄️📦️ Storing order draft {order}");
        self.db.insert_order(order).await
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementGatewayError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, SettlementGatewayError> {
        self.db.fetch_orders().await
    }

    /// Fulfillment transition. Only `Paid` orders can be marked `Ready`.
    pub async fn mark_order_ready(&self, order_id: &OrderId) -> Result<Order, SettlementGatewayError> {
        let order = self.db.mark_order_ready(order_id).await?;
        info!("🔄️📦️ Order {} is ready for fulfillment.", order.id);
        Ok(order)
    }

    async fn call_order_paid_hook(&self, order: &Order, lines: &[crate::traits::LineSettlement]) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone(), lines.to_vec());
            emitter.publish_event(event).await;
        }
    }

    async fn call_product_written_hook(&self, product_id: &str) {
        for emitter in &self.producers.product_written_producer {
            emitter.publish_event(ProductWrittenEvent::new(product_id)).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
