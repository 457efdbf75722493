use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use settlement_engine::{
    db_types::{OrderId, OrderStatusType},
    events::EventProducers,
    traits::SettlementGatewayError,
    CatalogApi,
    SettlementFlowApi,
};

use super::{
    helpers::{sample_order, sample_product, send_request},
    mocks::MockSettlementGateway,
};
use crate::routes::{CreateOrderRoute, OrderByIdRoute, OrderReadyRoute, OrdersRoute};

fn order_routes(flow_db: MockSettlementGateway, catalog_db: MockSettlementGateway, cfg: &mut ServiceConfig) {
    let flow_api = SettlementFlowApi::new(flow_db, EventProducers::default());
    let catalog_api = CatalogApi::new(catalog_db, EventProducers::default());
    let scope = web::scope("/api")
        .service(CreateOrderRoute::<MockSettlementGateway>::new())
        .service(OrdersRoute::<MockSettlementGateway>::new())
        .service(OrderReadyRoute::<MockSettlementGateway>::new())
        .service(OrderByIdRoute::<MockSettlementGateway>::new());
    cfg.app_data(web::Data::new(flow_api)).app_data(web::Data::new(catalog_api)).service(scope);
}

#[actix_web::test]
async fn creating_a_draft_clamps_quantities_to_available_stock() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut flow_db = MockSettlementGateway::new();
        flow_db
            .expect_insert_order()
            .withf(|order| order.items.len() == 1 && order.items[0].quantity == 3)
            .returning(|_| Ok(sample_order("ORD-2001", OrderStatusType::Created)));
        let mut catalog_db = MockSettlementGateway::new();
        catalog_db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 3))));
        order_routes(flow_db, catalog_db, cfg);
    }
    let body = json!({
        "customerEmail": "alice@example.com",
        "items": [{ "id": "PRD-1", "name": "Classic Tee", "price": 1999, "quantity": 10 }],
        "currency": "USD"
    });
    let req = TestRequest::post().uri("/api/orders").set_json(&body);
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ORD-2001"), "unexpected body: {body}");
}

#[actix_web::test]
async fn drafts_with_no_purchasable_items_are_rejected() {
    fn configure(cfg: &mut ServiceConfig) {
        let flow_db = MockSettlementGateway::new();
        let mut catalog_db = MockSettlementGateway::new();
        // Everything the customer asked for is out of stock.
        catalog_db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 0))));
        order_routes(flow_db, catalog_db, cfg);
    }
    let body = json!({
        "customerEmail": "alice@example.com",
        "items": [{ "id": "PRD-1", "quantity": 2 }]
    });
    let req = TestRequest::post().uri("/api/orders").set_json(&body);
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fetching_an_order_by_id() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut flow_db = MockSettlementGateway::new();
        flow_db
            .expect_fetch_order_by_order_id()
            .withf(|id: &OrderId| id.as_str() == "ORD-1001")
            .returning(|_| Ok(Some(sample_order("ORD-1001", OrderStatusType::Paid))));
        order_routes(flow_db, MockSettlementGateway::new(), cfg);
    }
    let req = TestRequest::get().uri("/api/orders/ORD-1001");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ORD-1001"), "unexpected body: {body}");
    assert!(body.contains("Paid"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetching_a_missing_order_is_a_404() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut flow_db = MockSettlementGateway::new();
        flow_db.expect_fetch_order_by_order_id().returning(|_| Ok(None));
        order_routes(flow_db, MockSettlementGateway::new(), cfg);
    }
    let req = TestRequest::get().uri("/api/orders/ORD-MISSING");
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn marking_an_unpaid_order_ready_is_a_client_error() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut flow_db = MockSettlementGateway::new();
        flow_db.expect_mark_order_ready().returning(|id| {
            Err(SettlementGatewayError::OrderNotFulfillable(id.clone(), "Created".to_string()))
        });
        order_routes(flow_db, MockSettlementGateway::new(), cfg);
    }
    let req = TestRequest::post().uri("/api/orders/ORD-1001/ready");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cannot be marked ready"), "unexpected body: {body}");
}

#[actix_web::test]
async fn marking_a_paid_order_ready() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut flow_db = MockSettlementGateway::new();
        flow_db.expect_mark_order_ready().returning(|_| Ok(sample_order("ORD-1001", OrderStatusType::Ready)));
        order_routes(flow_db, MockSettlementGateway::new(), cfg);
    }
    let req = TestRequest::post().uri("/api/orders/ORD-1001/ready");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ready"), "unexpected body: {body}");
}
