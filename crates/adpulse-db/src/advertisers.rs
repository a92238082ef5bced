//! Database operations for the `advertisers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `advertisers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdvertiserRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    /// Ad-library page id, stored as text to avoid precision loss.
    pub page_id: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active advertisers, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_advertisers(pool: &PgPool) -> Result<Vec<AdvertiserRow>, DbError> {
    let rows = sqlx::query_as::<_, AdvertiserRow>(
        "SELECT id, public_id, name, slug, page_id, notes, is_active, \
                last_scraped_at, created_at, updated_at \
         FROM advertisers \
         WHERE is_active = true \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single active advertiser by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_advertiser_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<AdvertiserRow>, DbError> {
    let row = sqlx::query_as::<_, AdvertiserRow>(
        "SELECT id, public_id, name, slug, page_id, notes, is_active, \
                last_scraped_at, created_at, updated_at \
         FROM advertisers \
         WHERE slug = $1 AND is_active = true",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Records that an ingest cycle just scraped this advertiser.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn touch_last_scraped(pool: &PgPool, advertiser_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE advertisers \
         SET last_scraped_at = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(advertiser_id)
    .execute(pool)
    .await?;
    Ok(())
}
