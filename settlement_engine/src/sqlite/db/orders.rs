use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentLinkage},
    traits::SettlementGatewayError,
};

/// Inserts the order into the database, returning `false` in the second parameter if the order
/// already exists.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), SettlementGatewayError> {
    let inserted = match fetch_order_by_order_id(&order.order_id, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("📝️ Order [{}] inserted", order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

/// Inserts a new order draft using the given connection. This is not atomic on its own. You can
/// embed this call inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as
/// the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SettlementGatewayError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                customer_email,
                status,
                items,
                subtotal,
                tax,
                shipping,
                discount,
                total,
                currency,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.customer_email)
    .bind(OrderStatusType::Created)
    .bind(Json(order.items))
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.shipping)
    .bind(order.discount)
    .bind(order.total)
    .bind(order.currency)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// All orders, newest first.
pub async fn fetch_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC").fetch_all(conn).await?;
    Ok(orders)
}

/// Merge the payment linkage and `Paid` status into the order.
///
/// Upsert-merge semantics: only the linkage fields, status and paid timestamp are written; nothing
/// else on the order is touched. If the order is already `Paid`, the existing linkage is immutable
/// and the stored record is returned unchanged, which makes a re-entered settlement harmless.
pub async fn mark_order_paid(
    order: &Order,
    linkage: &PaymentLinkage,
    paid_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, SettlementGatewayError> {
    if order.is_paid() {
        debug!("📝️ Order {} is already paid. Leaving its payment linkage untouched.", order.id);
        return Ok(order.clone());
    }
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                paid_at = $2,
                session_id = $3,
                payment_intent_id = $4,
                amount_paid = $5,
                paid_currency = $6
            WHERE id = $7
            RETURNING *;
        "#,
    )
    .bind(OrderStatusType::Paid)
    .bind(paid_at)
    .bind(&linkage.session_id)
    .bind(&linkage.payment_intent_id)
    .bind(linkage.amount_total)
    .bind(&linkage.currency)
    .bind(order.id.as_str())
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// Set the order status, returning the updated record, or `None` if the order does not exist.
pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET status = $1 WHERE id = $2 RETURNING *")
        .bind(status)
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}
