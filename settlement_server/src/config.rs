use std::env;

use chrono::Duration;
use log::*;
use settlement_engine::db_url;
use ssg_common::{helpers::parse_boolean_flag, Secret};

const DEFAULT_SSG_HOST: &str = "127.0.0.1";
const DEFAULT_SSG_PORT: u16 = 8460;
const DEFAULT_SIGNATURE_TOLERANCE: Duration = Duration::minutes(5);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Payment processor webhook configuration
    pub stripe: StripeConfig,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// The shared secret the processor signs webhook payloads with.
    pub webhook_secret: Secret<String>,
    /// If false, the server will not verify webhook signatures and will accept any payload.
    /// **DANGER** - only useful for local development against replayed fixtures.
    pub signature_checks: bool,
    /// Maximum accepted age of a signed webhook timestamp.
    pub signature_tolerance: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SSG_HOST.to_string(),
            port: DEFAULT_SSG_PORT,
            database_url: String::default(),
            stripe: StripeConfig::default(),
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            webhook_secret: Secret::default(),
            signature_checks: true,
            signature_tolerance: DEFAULT_SIGNATURE_TOLERANCE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SSG_HOST").ok().unwrap_or_else(|| DEFAULT_SSG_HOST.into());
        let port = env::var("SSG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SSG_PORT. {e} Using the default, {DEFAULT_SSG_PORT}, instead."
                    );
                    DEFAULT_SSG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SSG_PORT);
        let database_url = db_url();
        let stripe = StripeConfig::from_env_or_defaults();
        Self { host, port, database_url, stripe }
    }
}

impl StripeConfig {
    pub fn from_env_or_defaults() -> Self {
        let webhook_secret = env::var("SSG_STRIPE_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SSG_STRIPE_WEBHOOK_SECRET is not set. Please set it to the webhook signing secret for your \
                 payment processor endpoint."
            );
            String::default()
        });
        let webhook_secret = Secret::new(webhook_secret);
        let signature_checks = parse_boolean_flag(env::var("SSG_STRIPE_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Webhook signature checks are disabled. Anyone who can reach this server can settle orders. Do \
                 not run production like this."
            );
        }
        let signature_tolerance = env::var("SSG_STRIPE_SIGNATURE_TOLERANCE")
            .map_err(|_| {
                info!(
                    "🪛️ SSG_STRIPE_SIGNATURE_TOLERANCE is not set. Using the default value of {} seconds.",
                    DEFAULT_SIGNATURE_TOLERANCE.num_seconds()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::seconds)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SSG_STRIPE_SIGNATURE_TOLERANCE. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_SIGNATURE_TOLERANCE);
        Self { webhook_secret, signature_checks, signature_tolerance }
    }
}
