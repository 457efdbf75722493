use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{EventId, LedgerEntry};

/// Fast-path existence check. A `true` result is authoritative (entries are only ever written on
/// full settlement success and never deleted); a `false` result still has to be confirmed by
/// [`mark_processed_if_absent`] inside the settlement transaction.
pub async fn is_processed(event_id: &EventId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let entry: Option<LedgerEntry> = sqlx::query_as("SELECT * FROM settlement_ledger WHERE event_id = $1")
        .bind(event_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(entry.is_some())
}

/// The atomic idempotency gate. Claims the event id with a conditional insert; returns `true` when
/// this call created the entry, `false` when another delivery already holds it. Run this inside
/// the same transaction as the settlement side effects so the existence check and the effects
/// cannot interleave with a concurrent redelivery.
pub async fn mark_processed_if_absent(
    event_id: &EventId,
    event_type: &str,
    processed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO settlement_ledger (event_id, event_type, processed_at) VALUES ($1, $2, $3) \
         ON CONFLICT (event_id) DO NOTHING",
    )
    .bind(event_id.as_str())
    .bind(event_type)
    .bind(processed_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_entry(event_id: &EventId, conn: &mut SqliteConnection) -> Result<Option<LedgerEntry>, sqlx::Error> {
    let entry = sqlx::query_as("SELECT * FROM settlement_ledger WHERE event_id = $1")
        .bind(event_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}
