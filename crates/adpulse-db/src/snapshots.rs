//! Database operations for the `ad_snapshots` table.
//!
//! One row per `(brand_id, ad_id, week_start)`: the rank an ad held in a
//! given Monday-anchored week. Snapshots deliberately carry no foreign key
//! to `ads` so history of a deleted ad id can survive a re-observation, but
//! the reconciler purges them alongside its own deletes.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `ad_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: i64,
    pub brand_id: i64,
    pub ad_id: String,
    pub week_start: NaiveDate,
    pub rank: i32,
    pub created_at: DateTime<Utc>,
}

/// Records the rank an ad held this week. Re-recording the same week
/// replaces the rank rather than adding a second row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_snapshot(
    pool: &PgPool,
    brand_id: i64,
    ad_id: &str,
    week_start: NaiveDate,
    rank: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO ad_snapshots (brand_id, ad_id, week_start, rank) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (brand_id, ad_id, week_start) DO UPDATE SET \
             rank = EXCLUDED.rank",
    )
    .bind(brand_id)
    .bind(ad_id)
    .bind(week_start)
    .bind(rank)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns an ad's weekly rank history, oldest week first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_for_ad(pool: &PgPool, ad_id: &str) -> Result<Vec<SnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT id, brand_id, ad_id, week_start, rank, created_at \
         FROM ad_snapshots \
         WHERE ad_id = $1 \
         ORDER BY week_start",
    )
    .bind(ad_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
