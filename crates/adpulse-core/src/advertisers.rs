use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One tracked competitor page from `config/advertisers.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertiserConfig {
    pub name: String,
    /// Numeric page id in the ad-transparency feed, kept as a string to
    /// avoid precision loss on 15+ digit ids.
    pub page_id: String,
    pub notes: Option<String>,
    /// Inactive advertisers stay in the file (and the database) but are
    /// skipped by ingest sweeps.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl AdvertiserConfig {
    /// Generate a URL-safe slug from the advertiser name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Deserialize)]
pub struct AdvertisersFile {
    pub advertisers: Vec<AdvertiserConfig>,
}

/// Load and validate the advertiser registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_advertisers(path: &Path) -> Result<AdvertisersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AdvertisersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: AdvertisersFile =
        serde_yaml::from_str(&content).map_err(ConfigError::AdvertisersFileParse)?;

    validate_advertisers(&file)?;

    Ok(file)
}

fn validate_advertisers(file: &AdvertisersFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();
    let mut seen_page_ids = HashSet::new();

    for advertiser in &file.advertisers {
        if advertiser.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "advertiser name must be non-empty".to_string(),
            ));
        }

        if advertiser.page_id.is_empty() || !advertiser.page_id.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ConfigError::Validation(format!(
                "advertiser '{}' has invalid page_id '{}'; must be all digits",
                advertiser.name, advertiser.page_id
            )));
        }

        let lower_name = advertiser.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate advertiser name: '{}'",
                advertiser.name
            )));
        }

        let slug = advertiser.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate advertiser slug: '{}' (from advertiser '{}')",
                slug, advertiser.name
            )));
        }

        if !seen_page_ids.insert(advertiser.page_id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate page_id: '{}' (from advertiser '{}')",
                advertiser.page_id, advertiser.name
            )));
        }
    }

    Ok(())
}
