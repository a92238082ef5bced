//! Integration tests for `AdLibraryClient::fetch_ads`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Covers the happy path, the oversample
//! count plumbing, and every error variant `fetch_ads` can propagate.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adpulse_scraper::{AdLibraryClient, ScraperError};

const ACTOR: &str = "vendor~ad-library-scraper";
const RUN_PATH: &str = "/acts/vendor~ad-library-scraper/run-sync-get-dataset-items";

/// Builds a client aimed at the mock server: 5-second timeout, test token.
fn test_client(server: &MockServer) -> AdLibraryClient {
    AdLibraryClient::with_base_url("test-token", ACTOR, 5, &server.uri())
        .expect("failed to build test AdLibraryClient")
}

fn one_item_json() -> serde_json::Value {
    json!([{
        "ad_archive_id": "123456789",
        "start_date": 1_715_558_400,
        "snapshot": {
            "title": "Summer Sale",
            "body": {"text": "Copy."},
            "images": [{"original_image_url": "https://cdn.example/43820195823107_1.jpg"}]
        }
    }])
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_ads_returns_dataset_items() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_item_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.fetch_ads("105986314746339", 50).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let items = result.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["ad_archive_id"], "123456789");
}

#[tokio::test]
async fn fetch_ads_sends_search_url_and_count() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .and(body_partial_json(json!({"count": 50})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.fetch_ads("105986314746339", 50).await;
    assert!(result.is_ok(), "count not forwarded: {result:?}");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let url = body["urls"][0]["url"].as_str().unwrap();
    assert!(url.contains("view_all_page_id=105986314746339"), "got {url}");
    assert!(url.contains("sort_data%5Bmode%5D=total_impressions"));
}

#[tokio::test]
async fn fetch_ads_empty_dataset_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = test_client(&server).fetch_ads("1", 50).await;
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_ads_maps_401_to_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad token"})))
        .mount(&server)
        .await;

    let err = test_client(&server).fetch_ads("1", 50).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Unauthorized { .. }),
        "expected Unauthorized, got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_ads_maps_404_to_actor_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no such actor"})))
        .mount(&server)
        .await;

    let err = test_client(&server).fetch_ads("1", 50).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::ActorNotFound { .. }),
        "expected ActorNotFound, got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_ads_maps_429_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let err = test_client(&server).fetch_ads("1", 50).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::RateLimited { retry_after_secs: 17 }),
        "expected RateLimited(17), got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_ads_maps_429_without_header_to_default_delay() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = test_client(&server).fetch_ads("1", 50).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::RateLimited { retry_after_secs: 60 }),
        "expected RateLimited(60), got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_ads_maps_500_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = test_client(&server).fetch_ads("1", 50).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 500, .. }),
        "expected UnexpectedStatus(500), got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_ads_rejects_non_array_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let err = test_client(&server).fetch_ads("1", 50).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Deserialize { .. }),
        "expected Deserialize, got: {err:?}"
    );
}
