//! Live integration tests for the reconcile pass using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database. Dates are pinned
//! (2024-01-08 is a Monday) so the weekly-longevity assertions are exact.

use chrono::NaiveDate;
use uuid::Uuid;

use adpulse_core::{week_start, CanonicalAd, CreativeType};
use adpulse_db::{
    get_ad, get_ads_for_brand, get_advertiser_by_slug, list_snapshots_for_ad, set_bookmark,
};
use adpulse_ingest::reconcile_advertiser;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_advertiser(pool: &sqlx::PgPool, slug: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO advertisers (public_id, name, slug, page_id, is_active) \
         VALUES ($1, $2, $3, $4, TRUE) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(format!("Test Advertiser {slug}"))
    .bind(slug)
    .bind("105986314746339")
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_test_advertiser failed for slug '{slug}': {e}"))
}

fn make_ad(ad_id: &str, rank: i32) -> CanonicalAd {
    CanonicalAd {
        ad_id: ad_id.to_string(),
        rank,
        creative_type: CreativeType::Image,
        creative_url: Some(format!("https://cdn.example/{ad_id}.jpg")),
        video_url: None,
        ad_copy: Some("Crisp, social, 5mg.".to_string()),
        headline: Some("summer sale".to_string()),
        cta_type: Some("SHOP_NOW".to_string()),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        ad_library_link: Some(format!("https://www.facebook.com/ads/library/?id={ad_id}")),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

// ---------------------------------------------------------------------------
// First sighting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn first_sighting_inserts_with_unit_longevity(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;
    let today = date(2024, 1, 8);

    let outcome = reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 1)], today)
        .await
        .expect("reconcile failed");

    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.deleted, 0);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.processed.len(), 1);
    assert_eq!(outcome.processed[0].ad_id, "ad-1");

    let row = get_ad(&pool, "ad-1")
        .await
        .expect("get_ad failed")
        .expect("ad-1 should exist");
    assert_eq!(row.first_seen, today);
    assert_eq!(row.last_seen, today);
    assert_eq!(row.weeks_in_top10, 1);
    assert!(!row.bookmarked);
    assert!(row.ai_tags().is_none(), "new ads start untagged");

    let snapshots = list_snapshots_for_ad(&pool, "ad-1")
        .await
        .expect("list_snapshots_for_ad failed");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].week_start, date(2024, 1, 8));
    assert_eq!(snapshots[0].rank, 1);
}

// ---------------------------------------------------------------------------
// Longevity accounting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn same_week_resight_holds_longevity_and_replaces_snapshot(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    // Monday the 8th at rank 2, Wednesday the 10th at rank 5.
    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 2)], date(2024, 1, 8))
        .await
        .expect("first reconcile failed");
    let outcome = reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 5)], date(2024, 1, 10))
        .await
        .expect("second reconcile failed");

    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.updated, 1);

    let row = get_ad(&pool, "ad-1")
        .await
        .expect("get_ad failed")
        .expect("ad-1 should exist");
    assert_eq!(row.weeks_in_top10, 1, "same ISO week must not advance");
    assert_eq!(row.last_seen, date(2024, 1, 10));
    assert_eq!(row.rank, 5);

    // Same week key, so the snapshot is replaced rather than appended.
    let snapshots = list_snapshots_for_ad(&pool, "ad-1")
        .await
        .expect("list_snapshots_for_ad failed");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].week_start, date(2024, 1, 8));
    assert_eq!(snapshots[0].rank, 5);
}

#[sqlx::test(migrations = "../../migrations")]
async fn new_week_resight_advances_longevity_and_appends_snapshot(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 1)], date(2024, 1, 10))
        .await
        .expect("first reconcile failed");
    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 3)], date(2024, 1, 16))
        .await
        .expect("second reconcile failed");

    let row = get_ad(&pool, "ad-1")
        .await
        .expect("get_ad failed")
        .expect("ad-1 should exist");
    assert_eq!(row.weeks_in_top10, 2);
    assert_eq!(row.first_seen, date(2024, 1, 10), "first_seen is immutable");
    assert_eq!(row.last_seen, date(2024, 1, 16));

    let snapshots = list_snapshots_for_ad(&pool, "ad-1")
        .await
        .expect("list_snapshots_for_ad failed");
    let weeks: Vec<NaiveDate> = snapshots.iter().map(|s| s.week_start).collect();
    assert_eq!(weeks, vec![date(2024, 1, 8), date(2024, 1, 15)]);
    assert_eq!(snapshots[1].rank, 3);
}

// ---------------------------------------------------------------------------
// Stale cleanup and bookmark protection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn vanished_ad_is_deleted_with_its_snapshots(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    reconcile_advertiser(
        &pool,
        brand_id,
        vec![make_ad("ad-keep", 1), make_ad("ad-gone", 2)],
        date(2024, 1, 8),
    )
    .await
    .expect("first reconcile failed");

    let outcome = reconcile_advertiser(
        &pool,
        brand_id,
        vec![make_ad("ad-keep", 1)],
        date(2024, 1, 16),
    )
    .await
    .expect("second reconcile failed");

    assert_eq!(outcome.deleted, 1);
    assert!(get_ad(&pool, "ad-gone")
        .await
        .expect("get_ad failed")
        .is_none());
    assert!(
        list_snapshots_for_ad(&pool, "ad-gone")
            .await
            .expect("list_snapshots_for_ad failed")
            .is_empty(),
        "snapshots of a deleted ad must be purged with it"
    );
    assert!(get_ad(&pool, "ad-keep")
        .await
        .expect("get_ad failed")
        .is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn bookmarked_ad_survives_disappearance(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    reconcile_advertiser(
        &pool,
        brand_id,
        vec![make_ad("ad-live", 1), make_ad("ad-saved", 2)],
        date(2024, 1, 8),
    )
    .await
    .expect("first reconcile failed");
    set_bookmark(&pool, "ad-saved", true)
        .await
        .expect("set_bookmark failed");

    let outcome = reconcile_advertiser(
        &pool,
        brand_id,
        vec![make_ad("ad-live", 1)],
        date(2024, 1, 16),
    )
    .await
    .expect("second reconcile failed");

    assert_eq!(outcome.deleted, 0);
    let saved = get_ad(&pool, "ad-saved")
        .await
        .expect("get_ad failed")
        .expect("bookmarked ad must survive");
    // Untouched by the merge: it was not in the batch.
    assert_eq!(saved.last_seen, date(2024, 1, 8));
    assert_eq!(saved.weeks_in_top10, 1);
    assert!(
        !list_snapshots_for_ad(&pool, "ad-saved")
            .await
            .expect("list_snapshots_for_ad failed")
            .is_empty(),
        "history of a bookmarked ad is retained"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_batch_clears_unbookmarked_ads(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    reconcile_advertiser(
        &pool,
        brand_id,
        vec![make_ad("ad-1", 1), make_ad("ad-2", 2)],
        date(2024, 1, 8),
    )
    .await
    .expect("first reconcile failed");

    let outcome = reconcile_advertiser(&pool, brand_id, Vec::new(), date(2024, 1, 16))
        .await
        .expect("empty reconcile failed");

    assert_eq!(outcome.deleted, 2);
    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.updated, 0);
    assert!(outcome.processed.is_empty());
    assert!(get_ads_for_brand(&pool, brand_id)
        .await
        .expect("get_ads_for_brand failed")
        .is_empty());
}

// ---------------------------------------------------------------------------
// Field refresh rules
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn missing_media_url_never_blanks_a_stored_one(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 1)], date(2024, 1, 8))
        .await
        .expect("first reconcile failed");

    let mut resight = make_ad("ad-1", 1);
    resight.creative_url = None;
    reconcile_advertiser(&pool, brand_id, vec![resight], date(2024, 1, 10))
        .await
        .expect("second reconcile failed");

    let row = get_ad(&pool, "ad-1")
        .await
        .expect("get_ad failed")
        .expect("ad-1 should exist");
    assert_eq!(
        row.creative_url.as_deref(),
        Some("https://cdn.example/ad-1.jpg")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn tags_survive_a_resight(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 1)], date(2024, 1, 8))
        .await
        .expect("first reconcile failed");
    let tags = adpulse_core::AiTags {
        asset_type: "product_shot".to_string(),
        visual_format: "single_image".to_string(),
        messaging_angle: "price_value".to_string(),
        hook_tactic: "bold_claim".to_string(),
        offer_type: "discount".to_string(),
    };
    adpulse_db::set_ad_tags(&pool, "ad-1", &tags)
        .await
        .expect("set_ad_tags failed");

    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 2)], date(2024, 1, 10))
        .await
        .expect("second reconcile failed");

    let row = get_ad(&pool, "ad-1")
        .await
        .expect("get_ad failed")
        .expect("ad-1 should exist");
    assert!(row.ai_tags().is_some(), "resight must not clear tags");
}

// ---------------------------------------------------------------------------
// Per-ad failure isolation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn per_ad_failure_does_not_abort_the_batch(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    // rank 0 violates the ads rank CHECK, so the first merge fails; the
    // second ad must still land.
    let bad = make_ad("ad-bad", 0);
    let good = make_ad("ad-good", 2);

    let outcome = reconcile_advertiser(&pool, brand_id, vec![bad, good], date(2024, 1, 8))
        .await
        .expect("reconcile failed at batch level");

    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].ad_id, "ad-bad");
    assert!(get_ad(&pool, "ad-good")
        .await
        .expect("get_ad failed")
        .is_some());
    assert!(get_ad(&pool, "ad-bad")
        .await
        .expect("get_ad failed")
        .is_none());
    assert!(
        list_snapshots_for_ad(&pool, "ad-bad")
            .await
            .expect("list_snapshots_for_ad failed")
            .is_empty(),
        "no snapshot for an ad that failed to merge"
    );
}

// ---------------------------------------------------------------------------
// Advertiser stamp
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_stamps_last_scraped_at(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    let before = get_advertiser_by_slug(&pool, "cann")
        .await
        .expect("get_advertiser_by_slug failed")
        .expect("advertiser should exist");
    assert!(before.last_scraped_at.is_none());

    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 1)], date(2024, 1, 8))
        .await
        .expect("reconcile failed");

    let after = get_advertiser_by_slug(&pool, "cann")
        .await
        .expect("get_advertiser_by_slug failed")
        .expect("advertiser should exist");
    assert!(after.last_scraped_at.is_some());
}

// ---------------------------------------------------------------------------
// Snapshot week key
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn snapshot_week_key_is_monday_of_the_sighting(pool: sqlx::PgPool) {
    let brand_id = insert_test_advertiser(&pool, "cann").await;

    // A Thursday sighting snapshots under that week's Monday.
    let thursday = date(2024, 1, 11);
    reconcile_advertiser(&pool, brand_id, vec![make_ad("ad-1", 4)], thursday)
        .await
        .expect("reconcile failed");

    let snapshots = list_snapshots_for_ad(&pool, "ad-1")
        .await
        .expect("list_snapshots_for_ad failed");
    assert_eq!(snapshots[0].week_start, week_start(thursday));
    assert_eq!(snapshots[0].week_start, date(2024, 1, 8));
}
