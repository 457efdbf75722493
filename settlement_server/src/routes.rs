//! Route and handler definitions for the order and catalog surfaces.
//!
//! Each worker thread processes requests sequentially, so handlers must never block the current
//! thread. Database work goes through the async engine APIs; anything long-running that is not
//! CPU-bound should be awaited, not slept on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use settlement_engine::{
    db_types::{NewOrder, OrderId, ProductWrite},
    helpers::{clamp_to_available, is_available},
    CatalogApi,
    SettlementFlowApi,
    SettlementGatewayDatabase,
};

use crate::{
    data_objects::{JsonResponse, NewOrderRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl SettlementGatewayDatabase);
/// Route handler for checkout start.
///
/// The storefront posts the order draft here before it requests a payment session from the
/// processor, so that the settlement webhook has an order to land on. Item quantities are clamped
/// to the currently sellable stock; items that are out of stock are dropped from the draft.
/// Unknown product ids pass through untouched, since the settlement path tolerates them anyway.
pub async fn create_order<B: SettlementGatewayDatabase>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<SettlementFlowApi<B>>,
    catalog: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    if request.customer_email.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("customerEmail must not be empty".to_string()));
    }
    let mut items = Vec::with_capacity(request.items.len());
    for mut item in request.items {
        match catalog.fetch_product(item.id.trim()).await? {
            Some(product) => {
                if !is_available(&product) {
                    info!("💻️ Product {} is out of stock. Dropping it from the order draft.", product.id);
                    continue;
                }
                item.quantity = clamp_to_available(&product, item.quantity);
                if item.quantity > 0 {
                    items.push(item);
                }
            },
            None => items.push(item),
        }
    }
    if items.is_empty() {
        return Err(ServerError::InvalidRequestBody("No purchasable items in the order".to_string()));
    }
    let order = api.create_order_draft(NewOrder::new(request.customer_email, items, request.currency)).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(orders => Get "/orders" impl SettlementGatewayDatabase);
pub async fn orders<B: SettlementGatewayDatabase>(
    api: web::Data<SettlementFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all orders");
    let orders = api.fetch_orders().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl SettlementGatewayDatabase);
pub async fn order_by_id<B: SettlementGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<SettlementFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ GET order {order_id}");
    match api.fetch_order(&order_id).await? {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(ServerError::NoRecordFound(format!("Order {order_id}"))),
    }
}

route!(order_ready => Post "/orders/{id}/ready" impl SettlementGatewayDatabase);
/// Fulfillment marks a paid order as ready for pickup or shipping. Any other status is a client
/// error; there is nothing to fulfil on an unpaid or cancelled order.
pub async fn order_ready<B: SettlementGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<SettlementFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ POST mark order {order_id} ready");
    let order = api.mark_order_ready(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl SettlementGatewayDatabase);
pub async fn products<B: SettlementGatewayDatabase>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let products = api.fetch_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(create_product => Post "/products" impl SettlementGatewayDatabase);
pub async fn create_product<B: SettlementGatewayDatabase>(
    body: web::Json<ProductWrite>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.create_product(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(product_by_id => Get "/products/{id}" impl SettlementGatewayDatabase);
pub async fn product_by_id<B: SettlementGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    match api.fetch_product(&id).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(ServerError::NoRecordFound(format!("Product {id}"))),
    }
}

route!(update_product => Put "/products/{id}" impl SettlementGatewayDatabase);
/// Full-replace update, matching the edit form's submit shape.
pub async fn update_product<B: SettlementGatewayDatabase>(
    path: web::Path<String>,
    body: web::Json<ProductWrite>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PUT product {id}");
    match api.update_product(&id, body.into_inner()).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(ServerError::NoRecordFound(format!("Product {id}"))),
    }
}

route!(delete_product => Delete "/products/{id}" impl SettlementGatewayDatabase);
pub async fn delete_product<B: SettlementGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE product {id}");
    if api.delete_product(&id).await? {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {id} deleted."))))
    } else {
        Err(ServerError::NoRecordFound(format!("Product {id}")))
    }
}
