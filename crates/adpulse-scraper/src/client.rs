//! HTTP client for the hosted ad-library scrape actor.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::ScraperError;

const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Client for the ad-library scrape actor's synchronous run endpoint.
///
/// One call starts an actor run with the advertiser's ad-library search URL
/// as input, blocks until the run finishes, and returns the dataset items.
/// Items come back as raw [`serde_json::Value`]s: the actor's output shape
/// drifts between builds, so all field interpretation is deferred to
/// [`crate::extract`].
pub struct AdLibraryClient {
    client: Client,
    base_url: String,
    token: String,
    actor: String,
}

/// Input document for one actor run.
#[derive(Debug, Serialize)]
struct ActorInput {
    urls: Vec<StartUrl>,
    count: u32,
}

#[derive(Debug, Serialize)]
struct StartUrl {
    url: String,
}

impl AdLibraryClient {
    /// Creates a client against the hosted actor platform.
    ///
    /// `actor` is the `<user>~<actor-name>` identifier as it appears in run
    /// URLs. The timeout must cover a full synchronous scrape, not a single
    /// round trip.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(token: &str, actor: &str, timeout_secs: u64) -> Result<Self, ScraperError> {
        Self::with_base_url(token, actor, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Like [`AdLibraryClient::new`] but aimed at an alternate API origin.
    /// Tests use this to point the client at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        token: &str,
        actor: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            actor: actor.to_string(),
        })
    }

    /// Fetches the advertiser's currently-running ads, impression-sorted,
    /// as raw dataset items. `limit` oversamples: dedup trims the batch to
    /// the tracked set afterwards.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Unauthorized`] — HTTP 401, bad or missing token.
    /// - [`ScraperError::ActorNotFound`] — HTTP 404, unknown actor id.
    /// - [`ScraperError::RateLimited`] — HTTP 429 from the actor platform.
    /// - [`ScraperError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`ScraperError::Http`] — network failure or timeout.
    /// - [`ScraperError::Deserialize`] — dataset body is not a JSON array.
    pub async fn fetch_ads(&self, page_id: &str, limit: u32) -> Result<Vec<Value>, ScraperError> {
        let url = format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url, self.actor
        );
        let input = ActorInput {
            urls: vec![StartUrl {
                url: search_url(page_id),
            }],
            count: limit,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ScraperError::Unauthorized { url });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::ActorNotFound { url });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<Vec<Value>>(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("dataset items for page {page_id}"),
            source: e,
        })
    }
}

/// Ad-library search URL for one page: all active ads, newest impressions
/// first. The actor expects the exact UI URL, bracketed sort keys included,
/// so everything variable is percent-encoded.
fn search_url(page_id: &str) -> String {
    let id = utf8_percent_encode(page_id, NON_ALPHANUMERIC);
    format!(
        "https://www.facebook.com/ads/library/?active_status=active&ad_type=all&country=US\
         &view_all_page_id={id}&search_type=page&media_type=all\
         &sort_data%5Bdirection%5D=desc&sort_data%5Bmode%5D=total_impressions"
    )
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
