//! The processor's webhook envelope.
//!
//! Payloads arrive as `{"id": "evt_...", "type": "...", "data": {"object": {...}}}`. Only
//! `checkout.session.completed` carries behaviour here; every other type deserializes into the
//! [`StripeEvent::Ignored`] variant so that new event types the processor starts sending are
//! acknowledged instead of bounced.
use serde::Deserialize;
use serde_json::{Map, Value};
use settlement_engine::db_types::{EventId, OrderId, PaymentLinkage};
use ssg_common::Money;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawStripeEvent")]
pub enum StripeEvent {
    CheckoutSessionCompleted { id: EventId, session: CheckoutSession },
    Ignored { id: EventId, event_type: String },
}

/// The slice of the processor's checkout session object the settlement cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Either a bare payment-intent id, or the expanded intent object. Only the id is kept.
    #[serde(default, deserialize_with = "intent_reference")]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CheckoutSession {
    /// The order this session settles, as recorded in the session metadata at checkout start.
    /// Absent or blank means there is nothing to settle and the event can only be acknowledged.
    pub fn order_id(&self) -> Option<OrderId> {
        self.metadata
            .get("orderId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| OrderId(s.to_string()))
    }

    pub fn linkage(&self) -> PaymentLinkage {
        PaymentLinkage {
            session_id: self.id.clone(),
            payment_intent_id: self.payment_intent.clone(),
            amount_total: self.amount_total.map(Money::from_minor_units),
            currency: self.currency.clone(),
        }
    }
}

#[derive(Deserialize)]
struct RawStripeEvent {
    id: EventId,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<RawEventData>,
}

#[derive(Deserialize)]
struct RawEventData {
    object: Value,
}

impl TryFrom<RawStripeEvent> for StripeEvent {
    type Error = String;

    fn try_from(raw: RawStripeEvent) -> Result<Self, Self::Error> {
        if raw.event_type != CHECKOUT_SESSION_COMPLETED {
            return Ok(StripeEvent::Ignored { id: raw.id, event_type: raw.event_type });
        }
        let object =
            raw.data.ok_or_else(|| format!("{CHECKOUT_SESSION_COMPLETED} event {} has no data object", raw.id))?.object;
        let session = serde_json::from_value::<CheckoutSession>(object)
            .map_err(|e| format!("Invalid checkout session in event {}. {e}", raw.id))?;
        Ok(StripeEvent::CheckoutSessionCompleted { id: raw.id, session })
    }
}

fn intent_reference<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: serde::Deserializer<'de> {
    let value = Value::deserialize(deserializer)?;
    let id = match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("id").and_then(Value::as_str).map(String::from),
        _ => None,
    };
    Ok(id)
}
