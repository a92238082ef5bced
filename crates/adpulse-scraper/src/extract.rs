//! Field extraction from raw ad-library items.
//!
//! The feed's item shape drifts: the same field arrives snake_cased from
//! one actor build and camelCased from another, media lives under `videos`,
//! `cards`, or `images` depending on the creative, and start dates arrive
//! as ISO strings or unix seconds. Every accessor here tries an ordered
//! cascade of locations and key spellings and takes the first non-empty
//! hit, so a malformed item degrades to empty fields instead of sinking
//! the batch.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use adpulse_core::CreativeType;

/// CDN media file token: `<10+ digit id>_<sequence>` followed by a
/// path/query boundary.
static MEDIA_FILE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{10,}_\d+)[._/?&]").expect("media file id pattern is valid")
});

/// Trailing-URL length used when no file token is present.
const FINGERPRINT_SUFFIX_LEN: usize = 150;

const EXTERNAL_ID_KEYS: &[&str] = &["ad_archive_id", "adArchiveID", "adArchiveId", "id"];
const TITLE_KEYS: &[&str] = &["title"];
const LINK_DESCRIPTION_KEYS: &[&str] = &["link_description", "linkDescription"];
const CTA_KEYS: &[&str] = &["cta_text", "ctaText"];
const START_DATE_ISO_KEYS: &[&str] = &["start_date_formatted", "startDateFormatted"];
const START_DATE_UNIX_KEYS: &[&str] = &["start_date", "startDate"];
const VIDEO_URL_KEYS: &[&str] = &["video_hd_url", "videoHdUrl", "video_sd_url", "videoSdUrl"];
const VIDEO_PREVIEW_KEYS: &[&str] = &["video_preview_image_url", "videoPreviewImageUrl"];
const IMAGE_URL_KEYS: &[&str] = &[
    "original_image_url",
    "originalImageUrl",
    "resized_image_url",
    "resizedImageUrl",
];

/// Media resolved for one item.
#[derive(Debug, Clone, Default)]
pub struct ExtractedMedia {
    pub video_url: Option<String>,
    /// The image itself, or the still preview when the creative is a video.
    pub image_url: Option<String>,
}

impl ExtractedMedia {
    #[must_use]
    pub fn creative_type(&self) -> CreativeType {
        if self.video_url.is_some() {
            CreativeType::Video
        } else {
            CreativeType::Image
        }
    }

    /// Identity token for this media, per [`media_fingerprint`].
    #[must_use]
    pub fn fingerprint(&self) -> String {
        media_fingerprint(self.video_url.as_deref(), self.image_url.as_deref())
    }
}

/// First non-empty string under any of `keys` directly on `value`.
/// A key that exists but holds an empty or blank string keeps cascading.
fn str_of<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| {
        value
            .get(k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

/// Like [`str_of`] but also accepts numbers, for ids the provider sometimes
/// emits unquoted.
fn string_like(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match value.get(k) {
        Some(Value::String(s)) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// The item's detail payload. Newer actor builds nest everything under
/// `snapshot`; older ones put the same fields at the top level.
fn snapshot(item: &Value) -> &Value {
    item.get("snapshot").unwrap_or(item)
}

fn first_of<'a>(snap: &'a Value, list_key: &str) -> Option<&'a Value> {
    snap.get(list_key)
        .and_then(Value::as_array)
        .and_then(|a| a.first())
}

fn first_card(snap: &Value) -> Option<&Value> {
    first_of(snap, "cards")
}

/// Provider-assigned archive id, when the item carries one in any spelling.
#[must_use]
pub fn external_id(item: &Value) -> Option<String> {
    string_like(item, EXTERNAL_ID_KEYS)
}

/// Headline cascade: primary-card title, then top-level title, then link
/// description. Trimmed and lowercased; `None` means "no headline".
#[must_use]
pub fn headline(item: &Value) -> Option<String> {
    let snap = snapshot(item);
    first_card(snap)
        .and_then(|card| str_of(card, TITLE_KEYS))
        .or_else(|| str_of(snap, TITLE_KEYS))
        .or_else(|| str_of(snap, LINK_DESCRIPTION_KEYS))
        .map(str::to_lowercase)
}

/// Ad copy: the snapshot body's `text`, a bare-string body, then the
/// primary card's body.
#[must_use]
pub fn body_text(item: &Value) -> Option<String> {
    let snap = snapshot(item);
    let from_body = snap.get("body").and_then(|body| match body {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        nested => str_of(nested, &["text"]).map(ToOwned::to_owned),
    });
    from_body.or_else(|| {
        first_card(snap)
            .and_then(|card| str_of(card, &["body"]))
            .map(ToOwned::to_owned)
    })
}

/// Call-to-action label, from the snapshot or its primary card.
#[must_use]
pub fn cta(item: &Value) -> Option<String> {
    let snap = snapshot(item);
    str_of(snap, CTA_KEYS)
        .or_else(|| first_card(snap).and_then(|card| str_of(card, CTA_KEYS)))
        .map(ToOwned::to_owned)
}

/// Unix-seconds start time of the creative's run.
///
/// Prefers the provider-formatted ISO date, falls back to the numeric unix
/// field, and yields 0 for "unknown" — callers must never prefer 0 over a
/// known timestamp.
#[must_use]
pub fn start_timestamp(item: &Value) -> i64 {
    if let Some(iso) = str_of(item, START_DATE_ISO_KEYS) {
        if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return midnight.and_utc().timestamp();
            }
        }
    }

    START_DATE_UNIX_KEYS
        .iter()
        .find_map(|k| item.get(k).and_then(Value::as_i64))
        .filter(|&ts| ts > 0)
        .unwrap_or(0)
}

/// Resolves the item's media. Video wins over image; within each kind the
/// cascade walks the dedicated media array, then the primary card, then
/// snapshot-level fields, trying both key spellings and preferring the
/// higher-quality URL variant. For video creatives the still preview is
/// resolved as the display image.
///
/// An item with no resolvable media is logged with the keys it did carry
/// and proceeds with empty media — never an error.
#[must_use]
pub fn media(item: &Value) -> ExtractedMedia {
    let snap = snapshot(item);
    let video_sources = [first_of(snap, "videos"), first_card(snap), Some(snap)];
    let image_sources = [first_of(snap, "images"), first_card(snap), Some(snap)];

    let video_url = video_sources
        .iter()
        .flatten()
        .find_map(|source| str_of(source, VIDEO_URL_KEYS))
        .map(ToOwned::to_owned);

    let image_url = if video_url.is_some() {
        video_sources
            .iter()
            .flatten()
            .find_map(|source| str_of(source, VIDEO_PREVIEW_KEYS))
            .or_else(|| {
                image_sources
                    .iter()
                    .flatten()
                    .find_map(|source| str_of(source, IMAGE_URL_KEYS))
            })
            .map(ToOwned::to_owned)
    } else {
        image_sources
            .iter()
            .flatten()
            .find_map(|source| str_of(source, IMAGE_URL_KEYS))
            .map(ToOwned::to_owned)
    };

    if video_url.is_none() && image_url.is_none() {
        let available: Vec<&str> = snap
            .as_object()
            .map(|obj| obj.keys().map(String::as_str).collect())
            .unwrap_or_default();
        tracing::warn!(
            ad_archive_id = external_id(item).as_deref().unwrap_or("<none>"),
            available_keys = ?available,
            "ad item carries no recognizable media"
        );
    }

    ExtractedMedia {
        video_url,
        image_url,
    }
}

/// Identity token for a media URL pair. The video URL wins when both are
/// present. The token is the CDN file id when the chosen URL contains one,
/// otherwise the URL's trailing 150 characters. Empty input yields an
/// empty fingerprint — "no media", which must never act as a duplicate key.
#[must_use]
pub fn media_fingerprint(video_url: Option<&str>, image_url: Option<&str>) -> String {
    let Some(url) = video_url.or(image_url) else {
        return String::new();
    };
    if url.is_empty() {
        return String::new();
    }

    if let Some(captures) = MEDIA_FILE_ID.captures(url) {
        if let Some(token) = captures.get(1) {
            return token.as_str().to_string();
        }
    }

    let chars: Vec<char> = url.chars().collect();
    let start = chars.len().saturating_sub(FINGERPRINT_SUFFIX_LEN);
    chars[start..].iter().collect()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
