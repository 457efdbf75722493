use serde::{Deserialize, Serialize};

use crate::{db_types::Order, traits::LineSettlement};

/// Emitted after a settlement transaction commits: the order is paid and inventory has been
/// adjusted.
#[derive(Debug, Clone)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub lines: Vec<LineSettlement>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, lines: Vec<LineSettlement>) -> Self {
        Self { order, lines }
    }
}

/// Emitted after any write to a product document (catalog create/update/delete, or a settlement
/// decrement). The stock-consistency pass subscribes to this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWrittenEvent {
    pub product_id: String,
}

impl ProductWrittenEvent {
    pub fn new<S: Into<String>>(product_id: S) -> Self {
        Self { product_id: product_id.into() }
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    ProductWritten(ProductWrittenEvent),
}
