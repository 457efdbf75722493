use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{Product, ProductWrite, Variant};

pub fn new_product_id() -> String {
    let mut rng = rand::thread_rng();
    format!("PRD-{:08X}{:08X}", rng.gen::<u32>(), rng.gen::<u32>())
}

pub async fn insert_product(
    id: &str,
    product: ProductWrite,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, name, price, stock, variants, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .bind(Json(product.variants))
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

/// Full-replace update, matching the catalog edit form's write shape. Returns `None` when the
/// product does not exist.
pub async fn update_product(
    id: &str,
    product: ProductWrite,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            UPDATE products
            SET name = $1, price = $2, stock = $3, variants = $4, updated_at = $5
            WHERE id = $6
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .bind(Json(product.variants))
    .bind(now)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

pub async fn delete_product(id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_product(id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY created_at DESC").fetch_all(conn).await?;
    Ok(products)
}

/// Write an updated variant array and its recomputed aggregate in one update, so the two can never
/// be observed out of sync by a concurrent reader of this product.
pub async fn update_product_inventory(
    id: &str,
    variants: &[Variant],
    stock: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET variants = $1, stock = $2, updated_at = $3 WHERE id = $4")
        .bind(Json(variants.to_vec()))
        .bind(stock)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Adjust only the product-level aggregate, leaving the variant array untouched. Used for
/// variant-less products, for the unresolved-variant fallback, and for the consistency pass.
pub async fn update_product_aggregate(
    id: &str,
    stock: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = $1, updated_at = $2 WHERE id = $3")
        .bind(stock)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
