//! Collapse a raw scrape batch into a ranked canonical set.
//!
//! Three passes, each keeping exactly one representative per group: by
//! provider id, by media fingerprint, by normalized headline. All passes
//! preserve first-arrival order, so the provider's impression sort carries
//! through to the final ranks. Items lacking a pass's key never merge in
//! that pass. The survivors are truncated to [`MAX_TRACKED_ADS`] and
//! ranked by position.

use std::collections::HashMap;

use chrono::DateTime;
use serde_json::Value;
use uuid::Uuid;

use adpulse_core::{CanonicalAd, CreativeType};

use crate::extract;

/// Upper bound on canonical ads tracked per advertiser and cycle.
pub const MAX_TRACKED_ADS: usize = 20;

/// Working form of one raw item between extraction and canonicalization.
#[derive(Debug, Clone)]
struct ExtractedAd {
    external_id: Option<String>,
    fingerprint: String,
    headline: Option<String>,
    ad_copy: Option<String>,
    cta: Option<String>,
    start_ts: i64,
    media: extract::ExtractedMedia,
}

fn extract_ad(item: &Value) -> ExtractedAd {
    let media = extract::media(item);
    ExtractedAd {
        external_id: extract::external_id(item),
        fingerprint: media.fingerprint(),
        headline: extract::headline(item),
        ad_copy: extract::body_text(item),
        cta: extract::cta(item),
        start_ts: extract::start_timestamp(item),
        media,
    }
}

/// Grouping key for an item the current pass cannot group: its own id, or
/// a fresh unique key when it has none. The `solo:` prefix keeps these out
/// of the pass's real key namespace, so keyless items never collapse into
/// each other merely for both being keyless.
fn solo_key(ad: &ExtractedAd) -> String {
    match &ad.external_id {
        Some(id) => format!("solo:{id}"),
        None => format!("solo:{}", Uuid::new_v4()),
    }
}

/// Earliest-known-start preference. A candidate displaces the incumbent
/// only when its start is known (non-zero) and the incumbent's is unknown
/// or later. Two unknowns keep the first-encountered item.
fn prefer_over(candidate: &ExtractedAd, incumbent: &ExtractedAd) -> bool {
    candidate.start_ts != 0 && (incumbent.start_ts == 0 || candidate.start_ts < incumbent.start_ts)
}

/// One collapse pass. `key_of` yields the grouping key, or `None` for
/// items this pass must keep individually. The group's representative sits
/// at the group's first-arrival position regardless of which member wins
/// the tie-break.
fn collapse<F>(ads: Vec<ExtractedAd>, key_of: F) -> Vec<ExtractedAd>
where
    F: Fn(&ExtractedAd) -> Option<String>,
{
    let mut order: Vec<String> = Vec::with_capacity(ads.len());
    let mut kept: HashMap<String, ExtractedAd> = HashMap::with_capacity(ads.len());

    for ad in ads {
        let key = key_of(&ad).unwrap_or_else(|| solo_key(&ad));
        if let Some(incumbent) = kept.get_mut(&key) {
            if prefer_over(&ad, incumbent) {
                *incumbent = ad;
            }
        } else {
            order.push(key.clone());
            kept.insert(key, ad);
        }
    }

    order.into_iter().filter_map(|k| kept.remove(&k)).collect()
}

fn canonicalize(ad: ExtractedAd, rank: i32) -> CanonicalAd {
    let creative_type = ad.media.creative_type();
    let (creative_url, video_url) = match creative_type {
        CreativeType::Video => (ad.media.image_url, ad.media.video_url),
        CreativeType::Image => (ad.media.image_url, None),
    };

    let ad_library_link = ad
        .external_id
        .as_ref()
        .map(|id| format!("https://www.facebook.com/ads/library/?id={id}"));
    let ad_id = ad
        .external_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let start_date = (ad.start_ts > 0)
        .then(|| DateTime::from_timestamp(ad.start_ts, 0))
        .flatten()
        .map(|dt| dt.date_naive());

    CanonicalAd {
        ad_id,
        rank,
        creative_type,
        creative_url,
        video_url,
        ad_copy: ad.ad_copy,
        headline: ad.headline,
        cta_type: ad.cta,
        start_date,
        ad_library_link,
    }
}

/// Full dedup pipeline over one advertiser's raw batch: extract every item,
/// collapse by external id, media fingerprint, and normalized headline in
/// that order, truncate to [`MAX_TRACKED_ADS`], and rank survivors 1-based
/// by position.
///
/// Never fails: malformed items degrade to empty fields and survive as
/// unique entries.
#[must_use]
pub fn dedup_batch(items: &[Value]) -> Vec<CanonicalAd> {
    let extracted: Vec<ExtractedAd> = items.iter().map(extract_ad).collect();

    let by_id = collapse(extracted, |ad| {
        ad.external_id.as_ref().map(|id| format!("id:{id}"))
    });
    let by_fingerprint = collapse(by_id, |ad| {
        (!ad.fingerprint.is_empty()).then(|| format!("fp:{}", ad.fingerprint))
    });
    let by_headline = collapse(by_fingerprint, |ad| {
        ad.headline.as_ref().map(|h| format!("hl:{h}"))
    });

    by_headline
        .into_iter()
        .take(MAX_TRACKED_ADS)
        .enumerate()
        .map(|(index, ad)| canonicalize(ad, i32::try_from(index + 1).unwrap_or(i32::MAX)))
        .collect()
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
