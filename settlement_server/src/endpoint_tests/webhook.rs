use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;
use settlement_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    traits::{LineSettlement, SettlementGatewayError, SettlementOutcome},
    SettlementFlowApi,
};
use ssg_common::Secret;

use super::{
    helpers::{sample_order, send_request},
    mocks::MockSettlementGateway,
};
use crate::{
    helpers::{sign_payload, SIGNATURE_HEADER},
    middleware::SignatureMiddlewareFactory,
    stripe_routes::StripeWebhookRoute,
};

const SECRET: &str = "whsec_endpoint_tests";

fn checkout_payload(event_id: &str, order_id: Option<&str>) -> String {
    let metadata = match order_id {
        Some(id) => json!({ "orderId": id }),
        None => json!({}),
    };
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_test_1",
            "payment_intent": "pi_1",
            "amount_total": 3998,
            "currency": "usd",
            "metadata": metadata
        }}
    })
    .to_string()
}

fn signed_post(body: &str) -> TestRequest {
    signed_post_at(body, Utc::now().timestamp())
}

fn signed_post_at(body: &str, timestamp: i64) -> TestRequest {
    let header = sign_payload(SECRET, timestamp, body.as_bytes());
    TestRequest::post()
        .uri("/stripe/webhook")
        .insert_header((SIGNATURE_HEADER, header))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
}

fn webhook_scope(db: MockSettlementGateway, cfg: &mut ServiceConfig) {
    let api = SettlementFlowApi::new(db, EventProducers::default());
    let scope = web::scope("/stripe")
        .wrap(SignatureMiddlewareFactory::new(Secret::new(SECRET.to_string()), Duration::minutes(5), true))
        .service(StripeWebhookRoute::<MockSettlementGateway>::new())
        .default_service(web::route().to(|| async { HttpResponse::MethodNotAllowed().finish() }));
    cfg.app_data(web::Data::new(api)).service(scope);
}

#[actix_web::test]
async fn a_valid_event_settles_the_order() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_is_event_processed().returning(|_| Ok(false));
        db.expect_settle_order()
            .withf(|ev, ty, oid, linkage| {
                ev.as_str() == "evt_1" &&
                    ty == "checkout.session.completed" &&
                    oid.as_str() == "ORD-1001" &&
                    linkage.session_id == "cs_test_1"
            })
            .returning(|_, _, _, _| {
                let order = sample_order("ORD-1001", OrderStatusType::Paid);
                let lines = vec![LineSettlement {
                    product_id: "PRD-1".to_string(),
                    quantity: 2,
                    resolved_variant: Some(0),
                    stock_after: 3,
                }];
                Ok(SettlementOutcome::Applied { order, lines, skipped: vec![] })
            });
        webhook_scope(db, cfg);
    }
    let body = checkout_payload("evt_1", Some("ORD-1001"));
    let (status, body) = send_request(signed_post(&body), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Order #ORD-1001 settled."), "unexpected body: {body}");
}

#[actix_web::test]
async fn redelivered_events_are_acknowledged_without_settling() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_is_event_processed().returning(|_| Ok(true));
        // settle_order must not be called.
        webhook_scope(db, cfg);
    }
    let body = checkout_payload("evt_1", Some("ORD-1001"));
    let (status, body) = send_request(signed_post(&body), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already processed"), "unexpected body: {body}");
}

#[actix_web::test]
async fn unknown_event_types_are_acknowledged() {
    fn configure(cfg: &mut ServiceConfig) {
        webhook_scope(MockSettlementGateway::new(), cfg);
    }
    let body = json!({"id": "evt_9", "type": "payment_intent.created", "data": {"object": {"id": "pi_9"}}}).to_string();
    let (status, body) = send_request(signed_post(&body), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ignored"), "unexpected body: {body}");
}

#[actix_web::test]
async fn sessions_without_an_order_reference_are_acknowledged() {
    fn configure(cfg: &mut ServiceConfig) {
        webhook_scope(MockSettlementGateway::new(), cfg);
    }
    let body = checkout_payload("evt_2", None);
    let (status, body) = send_request(signed_post(&body), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No orderId"), "unexpected body: {body}");
}

#[actix_web::test]
async fn backend_failures_ask_the_processor_to_redeliver() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_is_event_processed().returning(|_| Ok(false));
        db.expect_settle_order()
            .returning(|_, _, _, _| Err(SettlementGatewayError::DatabaseError("disk I/O error".to_string())));
        webhook_scope(db, cfg);
    }
    let body = checkout_payload("evt_3", Some("ORD-1001"));
    let (status, _) = send_request(signed_post(&body), configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn tampered_bodies_are_rejected() {
    fn configure(cfg: &mut ServiceConfig) {
        webhook_scope(MockSettlementGateway::new(), cfg);
    }
    let body = checkout_payload("evt_4", Some("ORD-1001"));
    let header = sign_payload(SECRET, Utc::now().timestamp(), body.as_bytes());
    let tampered = body.replace("ORD-1001", "ORD-9999");
    let req = TestRequest::post()
        .uri("/stripe/webhook")
        .insert_header((SIGNATURE_HEADER, header))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(tampered);
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unsigned_requests_are_rejected() {
    fn configure(cfg: &mut ServiceConfig) {
        webhook_scope(MockSettlementGateway::new(), cfg);
    }
    let body = checkout_payload("evt_5", Some("ORD-1001"));
    let req = TestRequest::post()
        .uri("/stripe/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body);
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn stale_signatures_are_rejected() {
    fn configure(cfg: &mut ServiceConfig) {
        webhook_scope(MockSettlementGateway::new(), cfg);
    }
    let body = checkout_payload("evt_6", Some("ORD-1001"));
    let an_hour_ago = Utc::now().timestamp() - 3600;
    let (status, _) = send_request(signed_post_at(&body, an_hour_ago), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn non_post_methods_are_rejected() {
    fn configure(cfg: &mut ServiceConfig) {
        webhook_scope(MockSettlementGateway::new(), cfg);
    }
    // Even a correctly signed request must use POST.
    let header = sign_payload(SECRET, Utc::now().timestamp(), b"");
    let req = TestRequest::get().uri("/stripe/webhook").insert_header((SIGNATURE_HEADER, header));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
