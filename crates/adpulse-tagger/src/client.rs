//! HTTP client for the OpenAI-compatible tagging provider.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use adpulse_core::AiTags;

use crate::error::TaggerError;
use crate::prompt::{self, CreativeBrief};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for the chat-completions tagging endpoint.
///
/// One call classifies one creative: system prompt carries the taxonomy,
/// user message carries the creative's metadata, and the response is forced
/// into JSON mode so the content parses directly into [`AiTags`].
pub struct TaggerClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl TaggerClient {
    /// Creates a client against the production provider API.
    ///
    /// # Errors
    ///
    /// Returns [`TaggerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, TaggerError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Like [`TaggerClient::new`] but aimed at an alternate API origin.
    /// Tests use this to point the client at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns [`TaggerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, TaggerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Classifies one creative into a complete five-axis tag set.
    ///
    /// # Errors
    ///
    /// - [`TaggerError::Api`] — non-2xx status from the provider.
    /// - [`TaggerError::EmptyResponse`] — no choices or no message content.
    /// - [`TaggerError::ParseTags`] — content is not a complete tag object.
    /// - [`TaggerError::Http`] — network failure, timeout, or a response
    ///   body that is not a chat-completions envelope.
    pub async fn tag_creative(&self, brief: &CreativeBrief) -> Result<AiTags, TaggerError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system",
                    content: prompt::system_prompt(),
                },
                WireMessage {
                    role: "user",
                    content: prompt::user_prompt(brief),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!(model = %self.model, "requesting creative tags");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(TaggerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(TaggerError::EmptyResponse)?;

        prompt::parse_tags(&content)
    }
}
