use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use settlement_engine::db_types::{Json, LineItem, Order, OrderId, OrderStatusType, Product, Variant};
use ssg_common::Money;

/// Run a single request against an app assembled by `configure` and return the status and body.
/// Errors surfaced by middleware or extractors are rendered the way actix would render them for a
/// real client.
pub async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => {
            let res = e.as_response_error().error_response();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
    }
}

pub fn sample_order(id: &str, status: OrderStatusType) -> Order {
    Order {
        id: OrderId(id.to_string()),
        customer_email: "alice@example.com".to_string(),
        status,
        items: Json(vec![LineItem {
            id: "PRD-1".to_string(),
            name: "Classic Tee".to_string(),
            price: Money::from_minor_units(1999),
            quantity: 2,
            variant_sku: Some("RED-M".to_string()),
            ..Default::default()
        }]),
        subtotal: Money::from_minor_units(3998),
        tax: Money::default(),
        shipping: Money::default(),
        discount: Money::default(),
        total: Money::from_minor_units(3998),
        currency: "USD".to_string(),
        session_id: None,
        payment_intent_id: None,
        amount_paid: None,
        paid_currency: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        paid_at: None,
    }
}

pub fn sample_product(id: &str, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: "Classic Tee".to_string(),
        price: Money::from_minor_units(1999),
        stock,
        variants: Json(vec![Variant::with_sku_and_stock("RED-M", stock)]),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}
