//! Converges an advertiser's stored ads onto a freshly deduplicated batch.
//!
//! The pass runs in three strokes: stale rows leave first (bookmarks shield
//! them), then each canonical ad is inserted or advanced, then the advertiser
//! is stamped. Per-ad failures are collected and skipped so one poisoned row
//! cannot starve the rest of the batch; earlier writes are never rolled back.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::PgPool;

use adpulse_core::{advance_weeks, week_start, CanonicalAd};
use adpulse_db::{AdRow, DbError};

/// One ad the merge pass could not persist. The batch keeps going; these are
/// surfaced on the outcome for the caller's report.
#[derive(Debug, Clone)]
pub struct AdMergeError {
    pub ad_id: String,
    pub message: String,
}

/// What one reconciliation pass did.
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// The canonical batch the pass worked through, in rank order. Ads that
    /// failed to merge are still present here and listed in `errors`.
    pub processed: Vec<CanonicalAd>,
    pub inserted: i32,
    pub updated: i32,
    pub deleted: i32,
    pub errors: Vec<AdMergeError>,
}

/// The write `merge_ad` will perform for one canonical ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeAction {
    /// First sighting: insert with `first_seen = last_seen = today`.
    Insert,
    /// Already tracked: bump `last_seen`/`rank`, longevity already decided.
    Update { weeks_in_top10: i32 },
}

/// Decide what to do with one canonical ad given what is stored for it.
///
/// Pure so the longevity rules can be tested without a database: the counter
/// advances by exactly 1 when the stored `last_seen` falls in an earlier
/// ISO week (Monday-anchored) than `today`, and holds otherwise.
fn plan_merge(stored: Option<&AdRow>, today: NaiveDate) -> MergeAction {
    match stored {
        Some(row) => MergeAction::Update {
            weeks_in_top10: advance_weeks(row.last_seen, row.weeks_in_top10, today),
        },
        None => MergeAction::Insert,
    }
}

/// Persist one canonical ad and record its weekly snapshot.
async fn merge_ad(
    pool: &PgPool,
    brand_id: i64,
    ad: &CanonicalAd,
    stored: Option<&AdRow>,
    today: NaiveDate,
) -> Result<MergeAction, DbError> {
    let action = plan_merge(stored, today);
    match action {
        MergeAction::Insert => adpulse_db::insert_ad(pool, brand_id, ad, today).await?,
        MergeAction::Update { weeks_in_top10 } => {
            adpulse_db::update_ad_seen(pool, ad, today, weeks_in_top10).await?;
        }
    }
    adpulse_db::upsert_snapshot(pool, brand_id, &ad.ad_id, week_start(today), ad.rank).await?;
    Ok(action)
}

/// Merge a deduplicated batch into the stored tracked set for one advertiser.
///
/// Order of operations:
///
/// 1. Delete stored ads absent from the batch, unless bookmarked. The delete
///    is a single statement, so the bookmark flag is read at deletion time.
/// 2. Load the survivors once, then insert or advance each canonical ad and
///    upsert its `(brand_id, ad_id, week_start)` snapshot. A failed ad is
///    logged and recorded on the outcome; the loop continues.
/// 3. Stamp the advertiser's `last_scraped_at`.
///
/// # Errors
///
/// Returns [`DbError`] only for batch-level failures (the stale delete, the
/// stored-set load, or the final stamp). Per-ad failures never abort the pass.
pub async fn reconcile_advertiser(
    pool: &PgPool,
    brand_id: i64,
    ads: Vec<CanonicalAd>,
    today: NaiveDate,
) -> Result<ReconcileOutcome, DbError> {
    let new_ad_ids: Vec<String> = ads.iter().map(|ad| ad.ad_id.clone()).collect();

    let deleted_ids = adpulse_db::delete_stale_ads(pool, brand_id, &new_ad_ids).await?;
    if !deleted_ids.is_empty() {
        tracing::info!(
            brand_id,
            deleted = deleted_ids.len(),
            "removed ads that left the tracked set"
        );
    }

    let stored: HashMap<String, AdRow> = adpulse_db::get_ads_for_brand(pool, brand_id)
        .await?
        .into_iter()
        .map(|row| (row.ad_id.clone(), row))
        .collect();

    let mut inserted: i32 = 0;
    let mut updated: i32 = 0;
    let mut errors: Vec<AdMergeError> = Vec::new();

    for ad in &ads {
        match merge_ad(pool, brand_id, ad, stored.get(&ad.ad_id), today).await {
            Ok(MergeAction::Insert) => inserted += 1,
            Ok(MergeAction::Update { .. }) => updated += 1,
            Err(e) => {
                tracing::error!(
                    brand_id,
                    ad_id = %ad.ad_id,
                    error = %e,
                    "failed to merge ad; continuing with batch"
                );
                errors.push(AdMergeError {
                    ad_id: ad.ad_id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    adpulse_db::touch_last_scraped(pool, brand_id).await?;

    Ok(ReconcileOutcome {
        processed: ads,
        inserted,
        updated,
        deleted: i32::try_from(deleted_ids.len()).unwrap_or(i32::MAX),
        errors,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
