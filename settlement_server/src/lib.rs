//! # Storefront settlement server
//! This module hosts the HTTP face of the settlement gateway. It is responsible for:
//! Listening for incoming webhook notifications from the payment processor.
//! Verifying the webhook signature against the raw request bytes.
//! Handing settled checkout sessions to the settlement engine, exactly once.
//! Exposing the order draft and catalog collaborator routes used by the storefront.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/stripe/webhook`: The webhook route for receiving payment-completion events.
//! * `/api/orders`, `/api/products`: collaborator routes for the storefront and catalog editors.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod stripe_event;
pub mod stripe_routes;

#[cfg(test)]
mod endpoint_tests;
