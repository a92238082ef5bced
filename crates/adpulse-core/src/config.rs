use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ADPULSE_ENV", "development"));

    let bind_addr = parse("ADPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ADPULSE_LOG_LEVEL", "info");
    let advertisers_path = PathBuf::from(or_default(
        "ADPULSE_ADVERTISERS_PATH",
        "./config/advertisers.yaml",
    ));

    let apify_token = lookup("APIFY_TOKEN").ok();
    let apify_actor = or_default(
        "ADPULSE_APIFY_ACTOR",
        "curious_coder~facebook-ads-library-scraper",
    );
    let openai_api_key = lookup("OPENAI_API_KEY").ok();
    let tagger_model = or_default("ADPULSE_TAGGER_MODEL", "gpt-4o-mini");

    let db_max_connections = parse_u32("ADPULSE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ADPULSE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ADPULSE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    // Synchronous actor runs block until the scrape finishes, so the HTTP
    // timeout has to cover a full feed crawl, not a single round trip.
    let scrape_request_timeout_secs = parse_u64("ADPULSE_SCRAPE_REQUEST_TIMEOUT_SECS", "180")?;
    let scrape_raw_limit = parse_u32("ADPULSE_SCRAPE_RAW_LIMIT", "50")?;

    let ingest_max_concurrent_advertisers =
        parse_usize("ADPULSE_INGEST_MAX_CONCURRENT_ADVERTISERS", "1")?;
    let ingest_cron = or_default("ADPULSE_INGEST_CRON", "0 0 6 * * MON");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        advertisers_path,
        apify_token,
        apify_actor,
        openai_api_key,
        tagger_model,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scrape_request_timeout_secs,
        scrape_raw_limit,
        ingest_max_concurrent_advertisers,
        ingest_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
