use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub advertisers_path: PathBuf,
    /// Token for the hosted scrape-actor platform. Ingest is disabled when unset.
    pub apify_token: Option<String>,
    /// Actor identifier, `<user>~<actor-name>` as it appears in the run URL.
    pub apify_actor: String,
    /// Key for the chat-completions endpoint. Tagging is disabled when unset.
    pub openai_api_key: Option<String>,
    pub tagger_model: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scrape_request_timeout_secs: u64,
    /// Raw items requested per advertiser, before dedup trims to the tracked top 20.
    pub scrape_raw_limit: u32,
    pub ingest_max_concurrent_advertisers: usize,
    /// Six-field cron expression for the scheduled weekly ingest.
    pub ingest_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("advertisers_path", &self.advertisers_path)
            .field("database_url", &"[redacted]")
            .field(
                "apify_token",
                &self.apify_token.as_ref().map(|_| "[redacted]"),
            )
            .field("apify_actor", &self.apify_actor)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("tagger_model", &self.tagger_model)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scrape_request_timeout_secs",
                &self.scrape_request_timeout_secs,
            )
            .field("scrape_raw_limit", &self.scrape_raw_limit)
            .field(
                "ingest_max_concurrent_advertisers",
                &self.ingest_max_concurrent_advertisers,
            )
            .field("ingest_cron", &self.ingest_cron)
            .finish()
    }
}
