//! One full ingest cycle for a single advertiser.
//!
//! A cycle is bracketed by an `ingest_runs` row: created `queued`, moved to
//! `running` before the provider call, and closed out `succeeded` or `failed`
//! with the merge counts. A provider or batch-level failure marks the run
//! failed on a best-effort basis and leaves previously committed rows alone;
//! the next cycle re-converges.

use sqlx::PgPool;

use adpulse_db::AdvertiserRow;
use adpulse_scraper::AdLibraryClient;

use crate::reconcile::{reconcile_advertiser, AdMergeError};
use crate::IngestError;

/// Where a cycle was started from. Stored verbatim on the run row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Cli,
    Api,
    Scheduler,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Api => "api",
            Self::Scheduler => "scheduler",
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts from one completed cycle, plus any per-ad merge failures.
#[derive(Debug)]
pub struct CycleReport {
    pub run_id: i64,
    pub ads_processed: i32,
    pub inserted: i32,
    pub updated: i32,
    pub deleted: i32,
    pub merge_errors: Vec<AdMergeError>,
}

/// Fetch, dedup, and reconcile one advertiser, bookkeeping the run row.
///
/// `raw_limit` is the oversampled provider item cap (config default 50); the
/// canonical batch is truncated to the tracked-set cap downstream. Callers
/// must not run two cycles for the same advertiser concurrently.
///
/// # Errors
///
/// Returns [`IngestError`] when the run row cannot be created or started,
/// the provider call fails, or the reconcile pass fails at batch level. In
/// the latter two cases the run row is marked `failed` best-effort first.
pub async fn run_cycle(
    pool: &PgPool,
    client: &AdLibraryClient,
    advertiser: &AdvertiserRow,
    trigger: TriggerSource,
    raw_limit: u32,
) -> Result<CycleReport, IngestError> {
    let run = adpulse_db::create_ingest_run(pool, advertiser.id, trigger.as_str()).await?;
    adpulse_db::start_ingest_run(pool, run.id).await?;

    tracing::info!(
        advertiser = %advertiser.slug,
        run_id = run.id,
        trigger = %trigger,
        "ingest cycle starting"
    );

    let raw = match client.fetch_ads(&advertiser.page_id, raw_limit).await {
        Ok(items) => items,
        Err(e) => {
            fail_run_best_effort(pool, run.id, &advertiser.slug, &e.to_string()).await;
            return Err(e.into());
        }
    };

    let ads = adpulse_scraper::dedup_batch(&raw);
    tracing::debug!(
        advertiser = %advertiser.slug,
        raw = raw.len(),
        canonical = ads.len(),
        "deduplicated raw batch"
    );

    let today = chrono::Utc::now().date_naive();
    let outcome = match reconcile_advertiser(pool, advertiser.id, ads, today).await {
        Ok(outcome) => outcome,
        Err(e) => {
            fail_run_best_effort(pool, run.id, &advertiser.slug, &e.to_string()).await;
            return Err(e.into());
        }
    };

    let ads_processed = i32::try_from(outcome.processed.len()).unwrap_or(i32::MAX);
    if let Err(e) = adpulse_db::complete_ingest_run(
        pool,
        run.id,
        ads_processed,
        outcome.inserted,
        outcome.updated,
        outcome.deleted,
    )
    .await
    {
        fail_run_best_effort(pool, run.id, &advertiser.slug, &e.to_string()).await;
        return Err(e.into());
    }

    tracing::info!(
        advertiser = %advertiser.slug,
        run_id = run.id,
        processed = ads_processed,
        inserted = outcome.inserted,
        updated = outcome.updated,
        deleted = outcome.deleted,
        merge_errors = outcome.errors.len(),
        "ingest cycle complete"
    );

    Ok(CycleReport {
        run_id: run.id,
        ads_processed,
        inserted: outcome.inserted,
        updated: outcome.updated,
        deleted: outcome.deleted,
        merge_errors: outcome.errors,
    })
}

/// Mark a run failed, logging rather than propagating a secondary error.
async fn fail_run_best_effort(pool: &PgPool, run_id: i64, slug: &str, message: &str) {
    if let Err(mark_err) = adpulse_db::fail_ingest_run(pool, run_id, message).await {
        tracing::error!(
            run_id,
            advertiser = %slug,
            error = %mark_err,
            "failed to mark ingest run as failed"
        );
    }
}
