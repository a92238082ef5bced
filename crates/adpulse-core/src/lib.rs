//! Shared domain types and configuration for adpulse.
//!
//! Everything here is pure: no I/O beyond reading the advertisers file and
//! the process environment. Every other workspace crate depends on this one;
//! this one depends on nothing else in the workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read advertisers file at {path}")]
    AdvertisersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse advertisers file")]
    AdvertisersFileParse(#[source] serde_yaml::Error),

    #[error("invalid advertisers file: {0}")]
    Validation(String),
}

pub mod ads;
pub mod advertisers;
pub mod app_config;
pub mod config;
pub mod week;

pub use ads::{AiTags, CanonicalAd, CreativeType};
pub use advertisers::{load_advertisers, AdvertiserConfig, AdvertisersFile};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use week::{advance_weeks, week_start};
