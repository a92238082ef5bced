//! `ingest` command: run an ingest cycle per advertiser.
//!
//! Each advertiser gets its own cycle and its own `ingest_runs` row, so a
//! failing advertiser is logged and skipped rather than aborting the sweep.
//! The command exits non-zero only when every advertiser fails.

use futures::stream::{self, StreamExt};

use adpulse_db::AdvertiserRow;
use adpulse_ingest::{run_cycle, CycleReport, IngestError, TriggerSource};
use adpulse_scraper::AdLibraryClient;

/// Load the advertisers to sweep.
///
/// With a slug filter the advertiser must exist and be active; otherwise
/// every active advertiser is returned.
pub(crate) async fn load_advertisers_for_ingest(
    pool: &sqlx::PgPool,
    advertiser_filter: Option<&str>,
) -> anyhow::Result<Vec<AdvertiserRow>> {
    if let Some(slug) = advertiser_filter {
        // The lookup only sees active rows, so a paused advertiser reads
        // the same as a missing one here.
        let advertiser = adpulse_db::get_advertiser_by_slug(pool, slug)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "advertiser '{slug}' not found or inactive; \
                     check config/advertisers.yaml and re-seed"
                )
            })?;
        Ok(vec![advertiser])
    } else {
        Ok(adpulse_db::list_active_advertisers(pool).await?)
    }
}

/// Run ingest cycles, up to `concurrency` advertisers at a time.
///
/// # Errors
///
/// Returns an error if the advertiser filter resolves to nothing, no scrape
/// token is configured, the client cannot be constructed, or every
/// advertiser's cycle fails.
pub(crate) async fn run_ingest(
    pool: &sqlx::PgPool,
    config: &adpulse_core::AppConfig,
    advertiser_filter: Option<&str>,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let advertisers = load_advertisers_for_ingest(pool, advertiser_filter).await?;
    if advertisers.is_empty() {
        println!("no active advertisers; run `adpulse-cli seed` first");
        return Ok(());
    }

    let Some(token) = config.apify_token.as_deref() else {
        anyhow::bail!("APIFY_TOKEN is not set; cannot ingest");
    };
    let client = AdLibraryClient::new(
        token,
        &config.apify_actor,
        config.scrape_request_timeout_secs,
    )?;

    let max_concurrent = concurrency
        .unwrap_or(config.ingest_max_concurrent_advertisers)
        .max(1);

    let results: Vec<(&AdvertiserRow, Result<CycleReport, IngestError>)> =
        stream::iter(&advertisers)
            .map(|advertiser| {
                let fut = run_cycle(
                    pool,
                    &client,
                    advertiser,
                    TriggerSource::Cli,
                    config.scrape_raw_limit,
                );
                async move { (advertiser, fut.await) }
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

    let mut inserted: i32 = 0;
    let mut updated: i32 = 0;
    let mut deleted: i32 = 0;
    let mut merge_errors: usize = 0;
    let mut failed: usize = 0;
    let advertiser_count = advertisers.len();

    for (advertiser, outcome) in &results {
        match outcome {
            Ok(report) => {
                inserted = inserted.saturating_add(report.inserted);
                updated = updated.saturating_add(report.updated);
                deleted = deleted.saturating_add(report.deleted);
                merge_errors += report.merge_errors.len();
            }
            Err(e) => {
                tracing::error!(advertiser = %advertiser.slug, error = %e, "ingest cycle failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!(
            failed,
            total = advertiser_count,
            "some advertisers failed during ingest"
        );
    }
    if failed == advertiser_count {
        anyhow::bail!("all {failed} advertisers failed ingest");
    }

    println!(
        "ingested {} of {advertiser_count} advertisers: {inserted} inserted, {updated} updated, {deleted} deleted",
        advertiser_count - failed
    );
    if merge_errors > 0 {
        println!("{merge_errors} ads failed to merge; see logs for details");
    }
    Ok(())
}
