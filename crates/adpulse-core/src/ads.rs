use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The kind of asset backing a creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreativeType {
    Image,
    Video,
}

impl CreativeType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CreativeType::Image => "image",
            CreativeType::Video => "video",
        }
    }
}

impl std::fmt::Display for CreativeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One deduplicated creative from a single scrape of an advertiser's feed,
/// ready for reconciliation against stored rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalAd {
    /// Provider ad-archive id, or a synthesized UUID when the provider item
    /// carried no identifier.
    pub ad_id: String,
    /// 1-based position in the deduplicated, impression-sorted batch.
    pub rank: i32,
    pub creative_type: CreativeType,
    /// Display asset: the image itself, or a still preview for videos.
    pub creative_url: Option<String>,
    pub video_url: Option<String>,
    pub ad_copy: Option<String>,
    pub headline: Option<String>,
    pub cta_type: Option<String>,
    /// Provider-reported start date; `None` when the provider gave none.
    pub start_date: Option<NaiveDate>,
    /// Deep link into the provider's transparency UI. Only present for real
    /// provider ids — synthesized ids have nowhere to link to.
    pub ad_library_link: Option<String>,
}

/// AI-derived creative classification across the five analysis axes.
///
/// All axes are mandatory: a model answer missing any of them fails
/// deserialization outright, so a partial classification can never reach
/// the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiTags {
    pub asset_type: String,
    pub visual_format: String,
    pub messaging_angle: String,
    pub hook_tactic: String,
    pub offer_type: String,
}

impl AiTags {
    /// Reassemble tags from individually-stored columns.
    ///
    /// Returns `None` unless every axis is present — rows tagged by older
    /// builds with fewer axes read back as untagged.
    #[must_use]
    pub fn from_parts(
        asset_type: Option<String>,
        visual_format: Option<String>,
        messaging_angle: Option<String>,
        hook_tactic: Option<String>,
        offer_type: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            asset_type: asset_type?,
            visual_format: visual_format?,
            messaging_angle: messaging_angle?,
            hook_tactic: hook_tactic?,
            offer_type: offer_type?,
        })
    }
}
