use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tagging provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("tagging provider returned no message content")]
    EmptyResponse,

    #[error("tag response is not a complete five-field tag object: {source} (content: {content})")]
    ParseTags {
        content: String,
        source: serde_json::Error,
    },
}
