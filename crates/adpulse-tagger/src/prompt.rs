//! Prompt assembly and response parsing for the creative tagger.
//!
//! The provider is asked for a single flat JSON object with exactly five
//! string fields, one per tagging axis, each drawn from a closed vocabulary.
//! Parsing is strict: anything short of all five fields is rejected so a
//! half-tagged ad can never look tagged.

use adpulse_core::{AiTags, CreativeType};

use crate::error::TaggerError;

const ASSET_TYPES: &[&str] = &[
    "lifestyle_photo",
    "product_shot",
    "ugc",
    "animation",
    "talking_head",
    "screen_recording",
];

const VISUAL_FORMATS: &[&str] = &[
    "single_image",
    "carousel",
    "short_video",
    "long_video",
    "gif",
    "meme",
];

const MESSAGING_ANGLES: &[&str] = &[
    "social_proof",
    "problem_solution",
    "lifestyle",
    "ingredient_focus",
    "price_value",
    "brand_story",
];

const HOOK_TACTICS: &[&str] = &[
    "question",
    "bold_claim",
    "statistic",
    "testimonial",
    "before_after",
    "curiosity_gap",
];

const OFFER_TYPES: &[&str] = &[
    "discount",
    "bundle",
    "free_shipping",
    "subscription",
    "limited_time",
    "none",
];

/// Ad copy is clipped before prompting; some advertisers paste essays.
const MAX_COPY_BYTES: usize = 2000;

/// The creative metadata a tagging prompt is built from.
///
/// Decoupled from the storage row so callers pass only what the prompt
/// needs.
#[derive(Debug, Clone)]
pub struct CreativeBrief {
    pub headline: Option<String>,
    pub ad_copy: Option<String>,
    pub cta: Option<String>,
    pub creative_type: CreativeType,
    pub creative_url: Option<String>,
}

/// Instruction prompt listing the five axes and their allowed values.
#[must_use]
pub fn system_prompt() -> String {
    format!(
        "You are a paid-social creative analyst for beverage brands. \
         Classify one ad creative along five axes. Respond with a single \
         JSON object containing exactly these five string fields, each set \
         to one value from its list:\n\
         {}\n{}\n{}\n{}\n{}\n\
         Pick the closest value when unsure. Output JSON only, no prose.",
        axis_line("asset_type", ASSET_TYPES),
        axis_line("visual_format", VISUAL_FORMATS),
        axis_line("messaging_angle", MESSAGING_ANGLES),
        axis_line("hook_tactic", HOOK_TACTICS),
        axis_line("offer_type", OFFER_TYPES),
    )
}

fn axis_line(name: &str, values: &[&str]) -> String {
    format!("- \"{name}\": one of {}", values.join(", "))
}

/// Renders the creative's metadata as the user message. Absent fields are
/// shown as `(none)` so the model sees the full field list every time.
#[must_use]
pub fn user_prompt(brief: &CreativeBrief) -> String {
    let copy = brief
        .ad_copy
        .as_deref()
        .map(|c| truncate_to_char_boundary(c, MAX_COPY_BYTES));
    format!(
        "Creative type: {}\nHeadline: {}\nAd copy: {}\nCall to action: {}\nMedia URL: {}",
        brief.creative_type,
        brief.headline.as_deref().unwrap_or("(none)"),
        copy.unwrap_or("(none)"),
        brief.cta.as_deref().unwrap_or("(none)"),
        brief.creative_url.as_deref().unwrap_or("(none)"),
    )
}

/// Parses the provider's message content into a complete tag set.
///
/// Tolerates a fenced code block around the JSON but nothing else: the
/// object must deserialize into [`AiTags`], whose five fields are all
/// required, so partial tag objects fail here.
///
/// # Errors
///
/// Returns [`TaggerError::ParseTags`] when the content is not a complete
/// five-field tag object.
pub fn parse_tags(content: &str) -> Result<AiTags, TaggerError> {
    let stripped = strip_code_fences(content);
    serde_json::from_str(stripped).map_err(|e| TaggerError::ParseTags {
        content: stripped.to_string(),
        source: e,
    })
}

fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}
