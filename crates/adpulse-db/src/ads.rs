//! Database operations for the `ads` table.
//!
//! `ad_id` is the natural key: rows are written by the weekly reconciler and
//! read back by the API and the tagging workflow. The five `tag_*` columns
//! are only ever written together; [`AdRow::ai_tags`] folds them into one
//! all-or-nothing composite.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use adpulse_core::{AiTags, CanonicalAd};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `ads` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdRow {
    pub ad_id: String,
    pub brand_id: i64,
    pub rank: i32,
    /// `"image"` or `"video"`, enforced by a CHECK constraint.
    pub creative_type: String,
    pub creative_url: Option<String>,
    pub video_url: Option<String>,
    pub ad_copy: Option<String>,
    pub headline: Option<String>,
    pub cta_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub ad_library_link: Option<String>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub weeks_in_top10: i32,
    pub bookmarked: bool,
    pub tag_asset_type: Option<String>,
    pub tag_visual_format: Option<String>,
    pub tag_messaging_angle: Option<String>,
    pub tag_hook_tactic: Option<String>,
    pub tag_offer_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdRow {
    /// The five tag columns as one composite value, present only when all
    /// five are set. A partially tagged row reads as untagged.
    #[must_use]
    pub fn ai_tags(&self) -> Option<AiTags> {
        AiTags::from_parts(
            self.tag_asset_type.clone(),
            self.tag_visual_format.clone(),
            self.tag_messaging_angle.clone(),
            self.tag_hook_tactic.clone(),
            self.tag_offer_type.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all stored ads for a brand, ordered by rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_ads_for_brand(pool: &PgPool, brand_id: i64) -> Result<Vec<AdRow>, DbError> {
    let rows = sqlx::query_as::<_, AdRow>(
        "SELECT ad_id, brand_id, rank, creative_type, creative_url, video_url, ad_copy, \
                headline, cta_type, start_date, ad_library_link, first_seen, last_seen, \
                weeks_in_top10, bookmarked, tag_asset_type, tag_visual_format, \
                tag_messaging_angle, tag_hook_tactic, tag_offer_type, created_at, updated_at \
         FROM ads \
         WHERE brand_id = $1 \
         ORDER BY rank, ad_id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single ad by its natural key, or `None` if not stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_ad(pool: &PgPool, ad_id: &str) -> Result<Option<AdRow>, DbError> {
    let row = sqlx::query_as::<_, AdRow>(
        "SELECT ad_id, brand_id, rank, creative_type, creative_url, video_url, ad_copy, \
                headline, cta_type, start_date, ad_library_link, first_seen, last_seen, \
                weeks_in_top10, bookmarked, tag_asset_type, tag_visual_format, \
                tag_messaging_angle, tag_hook_tactic, tag_offer_type, created_at, updated_at \
         FROM ads \
         WHERE ad_id = $1",
    )
    .bind(ad_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a newly observed canonical ad.
///
/// `first_seen` and `last_seen` both start at `today`; `weeks_in_top10` and
/// `bookmarked` take their column defaults (1 and false).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate
/// `ad_id`).
pub async fn insert_ad(
    pool: &PgPool,
    brand_id: i64,
    ad: &CanonicalAd,
    today: NaiveDate,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO ads \
           (ad_id, brand_id, rank, creative_type, creative_url, video_url, ad_copy, \
            headline, cta_type, start_date, ad_library_link, first_seen, last_seen) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)",
    )
    .bind(&ad.ad_id)
    .bind(brand_id)
    .bind(ad.rank)
    .bind(ad.creative_type.as_str())
    .bind(&ad.creative_url)
    .bind(&ad.video_url)
    .bind(&ad.ad_copy)
    .bind(&ad.headline)
    .bind(&ad.cta_type)
    .bind(ad.start_date)
    .bind(&ad.ad_library_link)
    .bind(today)
    .execute(pool)
    .await?;
    Ok(())
}

/// Refreshes a stored ad that reappeared in this cycle's canonical batch.
///
/// Only the observation fields move: `last_seen`, `rank`, `weeks_in_top10`
/// (computed by the caller), and `creative_type`. Media URLs are overlaid
/// with `COALESCE` so a cycle that failed to extract a URL never blanks a
/// stored one. Textual fields (`headline`, `ad_copy`, `cta_type`) and
/// `start_date` keep their first-observed values.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists for `ad.ad_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_ad_seen(
    pool: &PgPool,
    ad: &CanonicalAd,
    last_seen: NaiveDate,
    weeks_in_top10: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ads \
         SET last_seen      = $2, \
             rank           = $3, \
             weeks_in_top10 = $4, \
             creative_type  = $5, \
             creative_url   = COALESCE($6, creative_url), \
             video_url      = COALESCE($7, video_url), \
             updated_at     = NOW() \
         WHERE ad_id = $1",
    )
    .bind(&ad.ad_id)
    .bind(last_seen)
    .bind(ad.rank)
    .bind(weeks_in_top10)
    .bind(ad.creative_type.as_str())
    .bind(&ad.creative_url)
    .bind(&ad.video_url)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Deletes the brand's stored ads that are absent from the new canonical
/// batch, except bookmarked ones. Snapshots of each deleted ad are purged in
/// the same statement, so a cancellation mid-cycle can never leave history
/// rows pointing at ads that are gone.
///
/// Returns the ids of the deleted ads.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_stale_ads(
    pool: &PgPool,
    brand_id: i64,
    keep_ids: &[String],
) -> Result<Vec<String>, DbError> {
    let deleted = sqlx::query_scalar::<_, String>(
        "WITH doomed AS ( \
             SELECT ad_id FROM ads \
             WHERE brand_id = $1 AND NOT bookmarked AND ad_id != ALL($2::TEXT[]) \
         ), purged AS ( \
             DELETE FROM ad_snapshots \
             WHERE brand_id = $1 AND ad_id IN (SELECT ad_id FROM doomed) \
         ) \
         DELETE FROM ads \
         WHERE brand_id = $1 AND ad_id IN (SELECT ad_id FROM doomed) \
         RETURNING ad_id",
    )
    .bind(brand_id)
    .bind(keep_ids)
    .fetch_all(pool)
    .await?;

    Ok(deleted)
}

/// Sets or clears the bookmark flag and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `ad_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_bookmark(pool: &PgPool, ad_id: &str, bookmarked: bool) -> Result<AdRow, DbError> {
    let row = sqlx::query_as::<_, AdRow>(
        "UPDATE ads \
         SET bookmarked = $2, updated_at = NOW() \
         WHERE ad_id = $1 \
         RETURNING ad_id, brand_id, rank, creative_type, creative_url, video_url, ad_copy, \
                   headline, cta_type, start_date, ad_library_link, first_seen, last_seen, \
                   weeks_in_top10, bookmarked, tag_asset_type, tag_visual_format, \
                   tag_messaging_angle, tag_hook_tactic, tag_offer_type, created_at, updated_at",
    )
    .bind(ad_id)
    .bind(bookmarked)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Persists a complete five-field tag set for an ad, verbatim.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `ad_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_ad_tags(pool: &PgPool, ad_id: &str, tags: &AiTags) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ads \
         SET tag_asset_type      = $2, \
             tag_visual_format   = $3, \
             tag_messaging_angle = $4, \
             tag_hook_tactic     = $5, \
             tag_offer_type      = $6, \
             updated_at          = NOW() \
         WHERE ad_id = $1",
    )
    .bind(ad_id)
    .bind(&tags.asset_type)
    .bind(&tags.visual_format)
    .bind(&tags.messaging_angle)
    .bind(&tags.hook_tactic)
    .bind(&tags.offer_type)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Returns ads missing any of the five tag columns, most recently seen
/// first. Partially tagged rows count as untagged.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_untagged_ads(pool: &PgPool, limit: i64) -> Result<Vec<AdRow>, DbError> {
    let rows = sqlx::query_as::<_, AdRow>(
        "SELECT ad_id, brand_id, rank, creative_type, creative_url, video_url, ad_copy, \
                headline, cta_type, start_date, ad_library_link, first_seen, last_seen, \
                weeks_in_top10, bookmarked, tag_asset_type, tag_visual_format, \
                tag_messaging_angle, tag_hook_tactic, tag_offer_type, created_at, updated_at \
         FROM ads \
         WHERE tag_asset_type IS NULL OR tag_visual_format IS NULL \
            OR tag_messaging_angle IS NULL OR tag_hook_tactic IS NULL \
            OR tag_offer_type IS NULL \
         ORDER BY last_seen DESC, ad_id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
