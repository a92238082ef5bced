//! `tag` command: classify untagged creatives along the five tag axes.
//!
//! Works through the untagged backlog most-recently-seen first. Per-ad
//! failures are logged and skipped; the command exits non-zero only when
//! every candidate fails, which usually means a bad API key rather than a
//! bad creative.

use adpulse_core::CreativeType;
use adpulse_db::AdRow;
use adpulse_tagger::{CreativeBrief, TaggerClient};

const DEFAULT_TAG_LIMIT: i64 = 50;

/// Chat-completion calls are small; they never need the scrape timeout.
const TAGGER_TIMEOUT_SECS: u64 = 60;

fn brief_for_ad(ad: &AdRow) -> CreativeBrief {
    // The CHECK constraint on ads.creative_type admits exactly these two.
    let creative_type = if ad.creative_type == "video" {
        CreativeType::Video
    } else {
        CreativeType::Image
    };
    CreativeBrief {
        headline: ad.headline.clone(),
        ad_copy: ad.ad_copy.clone(),
        cta: ad.cta_type.clone(),
        creative_type,
        creative_url: ad.creative_url.clone(),
    }
}

/// # Errors
///
/// Returns an error if no API key is configured, the client cannot be
/// constructed, the backlog query fails, or every candidate fails to tag.
pub(crate) async fn run_tag(
    pool: &sqlx::PgPool,
    config: &adpulse_core::AppConfig,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        anyhow::bail!("OPENAI_API_KEY is not set; cannot tag");
    };
    let client = TaggerClient::new(api_key, &config.tagger_model, TAGGER_TIMEOUT_SECS)?;

    let limit = limit.unwrap_or(DEFAULT_TAG_LIMIT).max(1);
    let ads = adpulse_db::list_untagged_ads(pool, limit).await?;
    if ads.is_empty() {
        println!("no untagged ads; nothing to do");
        return Ok(());
    }

    let mut tagged: usize = 0;
    let mut failed: usize = 0;

    for ad in &ads {
        let brief = brief_for_ad(ad);
        match client.tag_creative(&brief).await {
            Ok(tags) => match adpulse_db::set_ad_tags(pool, &ad.ad_id, &tags).await {
                Ok(()) => {
                    tracing::debug!(ad_id = %ad.ad_id, "tagged creative");
                    tagged += 1;
                }
                Err(e) => {
                    tracing::error!(ad_id = %ad.ad_id, error = %e, "failed to store tags");
                    failed += 1;
                }
            },
            Err(e) => {
                tracing::error!(ad_id = %ad.ad_id, error = %e, "failed to tag creative");
                failed += 1;
            }
        }
    }

    if failed == ads.len() {
        anyhow::bail!("all {failed} candidates failed tagging");
    }

    println!("tagged {tagged} of {} candidates ({failed} failed)", ads.len());
    Ok(())
}
