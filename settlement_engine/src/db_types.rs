use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, Type};
pub use sqlx::types::Json;
use ssg_common::Money;
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate a fresh order id for a checkout draft.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self(format!("ORD-{:08X}{:08X}", rng.gen::<u32>(), rng.gen::<u32>()))
    }
}

//--------------------------------------        EventId        -------------------------------------------------------
/// The payment processor's identifier for a single notification. Redeliveries of the same logical
/// event carry the same id, which is what makes it usable as an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct EventId(pub String);

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order draft has been created at checkout start.
    Created,
    /// The order is awaiting payment confirmation.
    Pending,
    /// Payment has been confirmed and inventory has been adjusted.
    Paid,
    /// The order has been fulfilled and is ready for pickup or shipping.
    Ready,
    /// The order has been cancelled by the user or an admin.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "Created"),
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Ready => write!(f, "Ready"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Created");
            OrderStatusType::Created
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Ready" => Ok(Self::Ready),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------       LineItem        -------------------------------------------------------
/// One product/variant/quantity tuple within an order, exactly as the storefront checkout wrote it.
///
/// The variant reference fields are identity *candidates*: catalog data may be inconsistent
/// (imported items, legacy orders), so resolution against the product's variant list is
/// best-effort. See [`crate::helpers::resolve_variant`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Money,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_title: Option<String>,
    /// Attribute name → selected value, in the storefront's own insertion order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

//--------------------------------------       Variant         -------------------------------------------------------
/// A purchasable configuration of a product with its own stock and price. Variants are embedded in
/// the product document, not stored as separate rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default, deserialize_with = "lenient_stock")]
    pub stock: Option<i64>,
    /// Legacy alias for `stock`, still present on imported catalog records.
    #[serde(default, deserialize_with = "lenient_stock")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Variant {
    pub fn with_sku_and_stock(sku: &str, stock: i64) -> Self {
        Variant { sku: Some(sku.to_string()), stock: Some(stock), ..Default::default() }
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_email: String,
    pub status: OrderStatusType,
    pub items: Json<Vec<LineItem>>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
    pub currency: String,
    /// Payment linkage. Non-null and immutable once the order is `Paid`.
    pub session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub amount_paid: Option<Money>,
    pub paid_currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatusType::Paid
    }
}

//--------------------------------------       NewOrder        -------------------------------------------------------
/// An order draft as written by the storefront at checkout start, before a payment session exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(customer_email: String, items: Vec<LineItem>, currency: String) -> Self {
        let subtotal = items.iter().map(|i| i.price * i.quantity.max(0)).sum::<Money>();
        Self {
            order_id: OrderId::random(),
            customer_email,
            items,
            subtotal,
            tax: Money::default(),
            shipping: Money::default(),
            discount: Money::default(),
            total: subtotal,
            currency,
            created_at: Utc::now(),
        }
    }
}

impl Display for NewOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} ({} items, {} {})", self.order_id, self.items.len(), self.total, self.currency)
    }
}

//--------------------------------------       Product         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    /// Denormalized aggregate stock. Equal to the sum of the variant stocks whenever `variants` is
    /// non-empty; authoritative on its own otherwise.
    pub stock: i64,
    pub variants: Json<Vec<Variant>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The full-replace write shape used by the catalog edit surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWrite {
    pub name: String,
    #[serde(default)]
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

//--------------------------------------    PaymentLinkage     -------------------------------------------------------
/// The processor-side payment identifiers attached to an order when it is settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLinkage {
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub amount_total: Option<Money>,
    pub currency: Option<String>,
}

//--------------------------------------      LedgerEntry      -------------------------------------------------------
/// Idempotency marker for a processed notification. Existence means "already applied".
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub event_id: EventId,
    pub event_type: String,
    pub processed_at: DateTime<Utc>,
}

//-------------------------------  Lenient numeric deserialization  --------------------------------------------------
// Catalog and order documents come from a duck-typed store. Quantities and stock counts may arrive
// as numbers, numeric strings, nulls, or garbage; anything non-numeric coerces to absent/zero
// rather than failing the whole document.

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

fn lenient_stock<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where D: Deserializer<'de> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_i64(&value))
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where D: Deserializer<'de> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_i64(&value).unwrap_or(0))
}
