use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpResponse, HttpServer};
use log::*;
use settlement_engine::{
    events::{EventHandlers, EventHooks, EventProducers, ProductWrittenEvent},
    CatalogApi,
    SettlementFlowApi,
    SettlementGatewayDatabase,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::SignatureMiddlewareFactory,
    routes::{
        health,
        CreateOrderRoute,
        CreateProductRoute,
        DeleteProductRoute,
        OrderByIdRoute,
        OrderReadyRoute,
        OrdersRoute,
        ProductByIdRoute,
        ProductsRoute,
        UpdateProductRoute,
    },
    stripe_routes::StripeWebhookRoute,
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, consistency_hooks(db.clone()));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The stock-consistency pass. Every product write, whether from the catalog edit surface or a
/// settlement decrement, lands here off the request path and re-syncs the aggregate stock.
pub fn consistency_hooks(db: SqliteDatabase) -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_product_written(move |ev: ProductWrittenEvent| {
        let db = db.clone();
        Box::pin(async move {
            match db.enforce_product_stock(&ev.product_id).await {
                Ok(Some(stock)) => info!("🛠️ Product {} aggregate stock re-synced to {stock}.", ev.product_id),
                Ok(None) => trace!("🛠️ Product {} stock is consistent.", ev.product_id),
                Err(e) => error!("🛠️ Stock consistency pass failed for product {}. {e}", ev.product_id),
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let flow_api = SettlementFlowApi::new(db.clone(), producers.clone());
        let catalog_api = CatalogApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ssg::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(catalog_api));
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderReadyRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new());
        let signature_checks = SignatureMiddlewareFactory::new(
            config.stripe.webhook_secret.clone(),
            config.stripe.signature_tolerance,
            config.stripe.signature_checks,
        );
        // The processor expects an explicit 405 on anything but POST.
        let stripe_scope = web::scope("/stripe")
            .wrap(signature_checks)
            .service(StripeWebhookRoute::<SqliteDatabase>::new())
            .default_service(web::route().to(|| async { HttpResponse::MethodNotAllowed().finish() }));
        app.service(health).service(api_scope).service(stripe_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
