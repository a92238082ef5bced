//! Ingest orchestration: one fetch → dedup → reconcile cycle per advertiser.
//!
//! This crate owns the write path that keeps each advertiser's stored ad set
//! converged on what the ad library currently shows. It composes the scrape
//! client and the query layer; it holds no state of its own. Per-advertiser
//! cycles must not run concurrently for the same advertiser — that is the
//! caller's contract — but cycles for different advertisers are independent.

use thiserror::Error;

/// Failure of a whole cycle. Per-ad merge failures do not surface here;
/// they ride along in [`ReconcileOutcome::errors`] while the batch continues.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("scrape failed: {0}")]
    Scrape(#[from] adpulse_scraper::ScraperError),

    #[error(transparent)]
    Db(#[from] adpulse_db::DbError),
}

pub mod cycle;
pub mod reconcile;

pub use cycle::{run_cycle, CycleReport, TriggerSource};
pub use reconcile::{reconcile_advertiser, AdMergeError, ReconcileOutcome};
