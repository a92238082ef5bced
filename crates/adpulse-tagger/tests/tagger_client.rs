//! Integration tests for `TaggerClient::tag_creative` against a wiremock
//! chat-completions endpoint.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adpulse_core::CreativeType;
use adpulse_tagger::{CreativeBrief, TaggerClient, TaggerError};

fn test_client(server: &MockServer) -> TaggerClient {
    TaggerClient::with_base_url("test-key", "test-model", 5, &server.uri())
        .expect("failed to build test TaggerClient")
}

fn video_brief() -> CreativeBrief {
    CreativeBrief {
        headline: Some("summer sale".to_string()),
        ad_copy: Some("Crisp, social, 5mg THC seltzer.".to_string()),
        cta: Some("SHOP_NOW".to_string()),
        creative_type: CreativeType::Video,
        creative_url: Some("https://cdn.example/v.mp4".to_string()),
    }
}

fn complete_tags_content() -> String {
    json!({
        "asset_type": "ugc",
        "visual_format": "short_video",
        "messaging_angle": "social_proof",
        "hook_tactic": "testimonial",
        "offer_type": "discount"
    })
    .to_string()
}

fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tag_creative_parses_complete_tag_object() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_body(&complete_tags_content())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tags = test_client(&server)
        .tag_creative(&video_brief())
        .await
        .expect("complete tag set should parse");

    assert_eq!(tags.asset_type, "ugc");
    assert_eq!(tags.visual_format, "short_video");
    assert_eq!(tags.messaging_angle, "social_proof");
    assert_eq!(tags.hook_tactic, "testimonial");
    assert_eq!(tags.offer_type, "discount");
}

#[tokio::test]
async fn tag_creative_accepts_fenced_content() {
    let server = MockServer::start().await;

    let fenced = format!("```json\n{}\n```", complete_tags_content());
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&fenced)))
        .mount(&server)
        .await;

    let tags = test_client(&server)
        .tag_creative(&video_brief())
        .await
        .expect("fenced tag set should parse");
    assert_eq!(tags.hook_tactic, "testimonial");
}

#[tokio::test]
async fn tag_creative_sends_creative_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_body(&complete_tags_content())),
        )
        .mount(&server)
        .await;

    test_client(&server)
        .tag_creative(&video_brief())
        .await
        .expect("request should succeed");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user_message = body["messages"][1]["content"].as_str().unwrap();
    assert!(user_message.contains("summer sale"), "got {user_message}");
    assert!(user_message.contains("SHOP_NOW"));
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tag_creative_rejects_partial_tag_object() {
    let server = MockServer::start().await;

    let partial = json!({"asset_type": "ugc", "visual_format": "short_video"}).to_string();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&partial)))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .tag_creative(&video_brief())
        .await
        .unwrap_err();
    assert!(
        matches!(err, TaggerError::ParseTags { .. }),
        "expected ParseTags, got: {err:?}"
    );
}

#[tokio::test]
async fn tag_creative_maps_empty_choices_to_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .tag_creative(&video_brief())
        .await
        .unwrap_err();
    assert!(
        matches!(err, TaggerError::EmptyResponse),
        "expected EmptyResponse, got: {err:?}"
    );
}

#[tokio::test]
async fn tag_creative_surfaces_provider_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "rate limit"}})),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .tag_creative(&video_brief())
        .await
        .unwrap_err();
    match err {
        TaggerError::Api { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limit"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}
