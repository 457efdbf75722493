use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// What one line item did to inventory during settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSettlement {
    pub product_id: String,
    pub quantity: i64,
    /// Index of the variant the item resolved to, or `None` when the product-level aggregate was
    /// decremented directly (variant-less product, or the best-effort match found nothing).
    pub resolved_variant: Option<usize>,
    /// The product's aggregate stock after the decrement.
    pub stock_after: i64,
}

/// The result of running the settlement transaction for one notification.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// The ledger entry was claimed and the order/inventory effects were applied.
    Applied {
        order: Order,
        lines: Vec<LineSettlement>,
        /// Line items that referenced products which no longer exist. Tolerated and skipped.
        skipped: Vec<String>,
    },
    /// The event id was already in the ledger. Redelivery absorbed; nothing changed.
    AlreadyProcessed,
}

impl SettlementOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, SettlementOutcome::AlreadyProcessed)
    }
}
