//----------------------------------------------   Webhook  ----------------------------------------------------

use actix_web::{web, HttpResponse};
use log::{debug, error, info, warn};
use settlement_engine::{SettlementFlowApi, SettlementGatewayDatabase, SettlementOutcome};

use crate::{
    data_objects::JsonResponse,
    route,
    stripe_event::{StripeEvent, CHECKOUT_SESSION_COMPLETED},
};

route!(stripe_webhook => Post "/webhook" impl SettlementGatewayDatabase);
/// The payment-completion webhook.
///
/// The signature middleware has already verified the raw body by the time this handler runs.
/// Response codes follow the processor's retry contract: anything the server has dealt with
/// (including duplicates, unrecognized event types, and sessions without an order reference) is a
/// 200, and only genuine backend failures return a 500 so that the processor redelivers.
pub async fn stripe_webhook<B: SettlementGatewayDatabase>(
    body: web::Json<StripeEvent>,
    api: web::Data<SettlementFlowApi<B>>,
) -> HttpResponse {
    match body.into_inner() {
        StripeEvent::Ignored { id, event_type } => {
            debug!("💳️ Ignoring webhook event {id} of type {event_type}.");
            HttpResponse::Ok().json(JsonResponse::success(format!("Event type {event_type} ignored.")))
        },
        StripeEvent::CheckoutSessionCompleted { id, session } => {
            let Some(order_id) = session.order_id() else {
                // Retrying cannot conjure up an order reference, so acknowledge and move on.
                warn!("💳️ Checkout session {} in event {id} carries no orderId metadata. Nothing to settle.", session.id);
                return HttpResponse::Ok().json(JsonResponse::failure("No orderId in session metadata."));
            };
            debug!("💳️ Checkout session {} completed for order {order_id}.", session.id);
            match api.process_checkout_completed(&id, CHECKOUT_SESSION_COMPLETED, &order_id, &session.linkage()).await
            {
                Ok(SettlementOutcome::AlreadyProcessed) => {
                    info!("💳️ Event {id} was already processed. Acknowledging redelivery.");
                    HttpResponse::Ok().json(JsonResponse::success("Event already processed."))
                },
                Ok(SettlementOutcome::Applied { order, lines, skipped }) => {
                    info!("💳️ Order {} settled against event {id}. {} line items applied.", order.id, lines.len());
                    if !skipped.is_empty() {
                        warn!("💳️ {} line items referenced products that no longer exist.", skipped.len());
                    }
                    HttpResponse::Ok().json(JsonResponse::success(format!("Order {} settled.", order.id)))
                },
                Err(e) => {
                    // A 500 here is deliberate: the processor will redeliver, and the rolled-back
                    // ledger entry means the retry starts from a clean slate.
                    error!("💳️ Could not settle order {order_id} for event {id}. {e}");
                    HttpResponse::InternalServerError().json(JsonResponse::failure(format!("Could not settle order. {e}")))
                },
            }
        },
    }
}
