//! # SQLite database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that
//! accept a `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or
//! create an atomic transaction as the need arises and call through to the functions without any
//! other changes.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod ledger;
pub mod orders;
pub mod products;

const SQLITE_DB_URL: &str = "sqlite://data/ssg_store.db";

pub fn db_url() -> String {
    let result = env::var("SSG_DATABASE_URL").unwrap_or_else(|_| {
        info!("SSG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Create the schema if it does not exist yet. Safe to call on every startup.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), SqlxError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY NOT NULL,
            customer_email TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'Created',
            items TEXT NOT NULL DEFAULT '[]',
            subtotal INTEGER NOT NULL DEFAULT 0,
            tax INTEGER NOT NULL DEFAULT 0,
            shipping INTEGER NOT NULL DEFAULT 0,
            discount INTEGER NOT NULL DEFAULT 0,
            total INTEGER NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT 'USD',
            session_id TEXT,
            payment_intent_id TEXT,
            amount_paid INTEGER,
            paid_currency TEXT,
            created_at TIMESTAMP NOT NULL,
            paid_at TIMESTAMP
        );
    "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            price INTEGER NOT NULL DEFAULT 0,
            stock INTEGER NOT NULL DEFAULT 0,
            variants TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        );
    "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settlement_ledger (
            event_id TEXT PRIMARY KEY NOT NULL,
            event_type TEXT NOT NULL DEFAULT '',
            processed_at TIMESTAMP NOT NULL
        );
    "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
