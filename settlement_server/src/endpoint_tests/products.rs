use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use settlement_engine::{events::EventProducers, CatalogApi};

use super::{
    helpers::{sample_product, send_request},
    mocks::MockSettlementGateway,
};
use crate::routes::{CreateProductRoute, DeleteProductRoute, ProductByIdRoute, ProductsRoute, UpdateProductRoute};

fn product_routes(db: MockSettlementGateway, cfg: &mut ServiceConfig) {
    let catalog_api = CatalogApi::new(db, EventProducers::default());
    let scope = web::scope("/api")
        .service(CreateProductRoute::<MockSettlementGateway>::new())
        .service(ProductsRoute::<MockSettlementGateway>::new())
        .service(UpdateProductRoute::<MockSettlementGateway>::new())
        .service(DeleteProductRoute::<MockSettlementGateway>::new())
        .service(ProductByIdRoute::<MockSettlementGateway>::new());
    cfg.app_data(web::Data::new(catalog_api)).service(scope);
}

#[actix_web::test]
async fn listing_the_catalog() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_fetch_products().returning(|| Ok(vec![sample_product("PRD-1", 5), sample_product("PRD-2", 0)]));
        product_routes(db, cfg);
    }
    let req = TestRequest::get().uri("/api/products");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("PRD-1") && body.contains("PRD-2"), "unexpected body: {body}");
}

#[actix_web::test]
async fn creating_a_product() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_create_product()
            .withf(|p| p.name == "Classic Tee" && p.variants.len() == 1)
            .returning(|_| Ok(sample_product("PRD-NEW", 5)));
        product_routes(db, cfg);
    }
    let body = json!({
        "name": "Classic Tee",
        "price": 1999,
        "stock": 5,
        "variants": [{ "sku": "RED-M", "stock": 5 }]
    });
    let req = TestRequest::post().uri("/api/products").set_json(&body);
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("PRD-NEW"), "unexpected body: {body}");
}

#[actix_web::test]
async fn updating_a_missing_product_is_a_404() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_update_product().returning(|_, _| Ok(None));
        product_routes(db, cfg);
    }
    let body = json!({ "name": "Ghost", "price": 0, "stock": 0, "variants": [] });
    let req = TestRequest::put().uri("/api/products/PRD-GONE").set_json(&body);
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_a_product() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_delete_product().withf(|id| id == "PRD-1").returning(|_| Ok(true));
        product_routes(db, cfg);
    }
    let req = TestRequest::delete().uri("/api/products/PRD-1");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("deleted"), "unexpected body: {body}");
}

#[actix_web::test]
async fn deleting_a_missing_product_is_a_404() {
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockSettlementGateway::new();
        db.expect_delete_product().returning(|_| Ok(false));
        product_routes(db, cfg);
    }
    let req = TestRequest::delete().uri("/api/products/PRD-GONE");
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
