//! End-to-end cycle tests: a wiremock ad-library provider in front of a
//! fresh `#[sqlx::test]` database. Covers run-row bookkeeping, the dedup →
//! reconcile hand-off, and failure marking when the provider misbehaves.

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adpulse_db::{get_ads_for_brand, get_advertiser_by_slug, get_ingest_run, list_ingest_runs};
use adpulse_ingest::{run_cycle, IngestError, TriggerSource};
use adpulse_scraper::{AdLibraryClient, ScraperError};

const ACTOR: &str = "vendor~ad-library-scraper";
const RUN_PATH: &str = "/acts/vendor~ad-library-scraper/run-sync-get-dataset-items";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_advertiser(pool: &sqlx::PgPool, slug: &str) -> adpulse_db::AdvertiserRow {
    sqlx::query(
        "INSERT INTO advertisers (public_id, name, slug, page_id, is_active) \
         VALUES ($1, $2, $3, $4, TRUE)",
    )
    .bind(Uuid::new_v4())
    .bind(format!("Test Advertiser {slug}"))
    .bind(slug)
    .bind("105986314746339")
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_test_advertiser failed for slug '{slug}': {e}"));

    get_advertiser_by_slug(pool, slug)
        .await
        .expect("get_advertiser_by_slug failed")
        .expect("advertiser should exist after insert")
}

fn test_client(server: &MockServer) -> AdLibraryClient {
    AdLibraryClient::with_base_url("test-token", ACTOR, 5, &server.uri())
        .expect("failed to build test AdLibraryClient")
}

/// Three raw items: the first and third share an archive id, so the canonical
/// batch is two ads with ranks 1 and 2.
fn raw_batch() -> serde_json::Value {
    json!([
        {
            "ad_archive_id": "901",
            "start_date": 1_704_672_000,
            "snapshot": {
                "title": "Summer Sale",
                "body": {"text": "Crisp, social, 5mg."},
                "cta_type": "SHOP_NOW",
                "images": [{"original_image_url": "https://cdn.example/4382019582310765_1.jpg"}]
            }
        },
        {
            "ad_archive_id": "902",
            "start_date": 1_704_672_000,
            "snapshot": {
                "title": "New Flavor Drop",
                "body": {"text": "Meet the grapefruit spritz."},
                "cta_type": "LEARN_MORE",
                "images": [{"original_image_url": "https://cdn.example/4382019582310888_1.jpg"}]
            }
        },
        {
            "ad_archive_id": "901",
            "start_date": 1_704_672_000,
            "snapshot": {
                "title": "Summer Sale",
                "body": {"text": "Crisp, social, 5mg."},
                "cta_type": "SHOP_NOW",
                "images": [{"original_image_url": "https://cdn.example/4382019582310765_1.jpg"}]
            }
        }
    ])
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cycle_collapses_dedups_and_records_success(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(raw_batch()))
        .expect(1)
        .mount(&server)
        .await;

    let advertiser = insert_test_advertiser(&pool, "cann").await;
    let client = test_client(&server);

    let report = run_cycle(&pool, &client, &advertiser, TriggerSource::Cli, 50)
        .await
        .expect("run_cycle failed");

    assert_eq!(report.ads_processed, 2, "duplicate archive id must collapse");
    assert_eq!(report.inserted, 2);
    assert_eq!(report.updated, 0);
    assert_eq!(report.deleted, 0);
    assert!(report.merge_errors.is_empty());

    let run = get_ingest_run(&pool, report.run_id)
        .await
        .expect("get_ingest_run failed");
    assert_eq!(run.status, "succeeded");
    assert_eq!(run.trigger_source, "cli");
    assert_eq!(run.ads_processed, 2);
    assert_eq!(run.inserted_count, 2);
    assert!(run.started_at.is_some());
    assert!(run.completed_at.is_some());

    let ads = get_ads_for_brand(&pool, advertiser.id)
        .await
        .expect("get_ads_for_brand failed");
    assert_eq!(ads.len(), 2);
    assert_eq!(ads[0].rank, 1);
    assert_eq!(ads[1].rank, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn second_sweep_updates_instead_of_inserting(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(raw_batch()))
        .expect(2)
        .mount(&server)
        .await;

    let advertiser = insert_test_advertiser(&pool, "cann").await;
    let client = test_client(&server);

    run_cycle(&pool, &client, &advertiser, TriggerSource::Api, 50)
        .await
        .expect("first run_cycle failed");
    let report = run_cycle(&pool, &client, &advertiser, TriggerSource::Api, 50)
        .await
        .expect("second run_cycle failed");

    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, 2);
    assert_eq!(report.deleted, 0);

    let runs = list_ingest_runs(&pool, 10)
        .await
        .expect("list_ingest_runs failed");
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status == "succeeded"));
    assert!(runs.iter().all(|r| r.trigger_source == "api"));
}

// ---------------------------------------------------------------------------
// Provider failure
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn provider_error_marks_the_run_failed(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let advertiser = insert_test_advertiser(&pool, "cann").await;
    let client = test_client(&server);

    let err = run_cycle(&pool, &client, &advertiser, TriggerSource::Scheduler, 50)
        .await
        .expect_err("run_cycle should fail on a 500");
    assert!(
        matches!(
            err,
            IngestError::Scrape(ScraperError::UnexpectedStatus { status: 500, .. })
        ),
        "expected UnexpectedStatus(500), got: {err:?}"
    );

    let runs = list_ingest_runs(&pool, 10)
        .await
        .expect("list_ingest_runs failed");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
    assert_eq!(runs[0].trigger_source, "scheduler");
    let message = runs[0]
        .error_message
        .as_deref()
        .expect("failed run should carry an error message");
    assert!(message.contains("500"), "got: {message}");

    assert!(get_ads_for_brand(&pool, advertiser.id)
        .await
        .expect("get_ads_for_brand failed")
        .is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn provider_failure_leaves_previous_state_untouched(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(raw_batch()))
        .expect(1)
        .mount(&server)
        .await;

    let advertiser = insert_test_advertiser(&pool, "cann").await;
    let client = test_client(&server);
    run_cycle(&pool, &client, &advertiser, TriggerSource::Cli, 50)
        .await
        .expect("seeding run_cycle failed");

    // Provider starts erroring; the stored set must not shrink.
    server.reset().await;
    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    run_cycle(&pool, &client, &advertiser, TriggerSource::Cli, 50)
        .await
        .expect_err("run_cycle should fail on a 429");

    let ads = get_ads_for_brand(&pool, advertiser.id)
        .await
        .expect("get_ads_for_brand failed");
    assert_eq!(ads.len(), 2, "committed rows survive a failed cycle");
}
