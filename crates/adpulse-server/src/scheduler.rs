//! Recurring ingest scheduler.
//!
//! One weekly job sweeps every active advertiser through an ingest cycle.
//! The schedule is replaceable at runtime via [`IngestScheduler::reconfigure`],
//! which the `PUT /api/v1/schedule` handler delegates to.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use adpulse_core::AppConfig;
use adpulse_ingest::{run_cycle, TriggerSource};
use adpulse_scraper::AdLibraryClient;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{cron}': {source}")]
    InvalidCron {
        cron: String,
        source: JobSchedulerError,
    },

    #[error(transparent)]
    Scheduler(#[from] JobSchedulerError),
}

/// Owns the running [`JobScheduler`], if any. `reconfigure` swaps the whole
/// scheduler out under a lock, so two timers can never coexist.
pub struct IngestScheduler {
    pool: PgPool,
    config: Arc<AppConfig>,
    inner: Mutex<Option<JobScheduler>>,
}

impl IngestScheduler {
    #[must_use]
    pub fn new(pool: PgPool, config: Arc<AppConfig>) -> Self {
        Self {
            pool,
            config,
            inner: Mutex::new(None),
        }
    }

    /// Replace the recurring ingest schedule with `cron` (six-field form,
    /// e.g. `0 0 6 * * MON`).
    ///
    /// Shuts down the running scheduler before starting the new one. The
    /// swap holds a lock for its whole duration, so concurrent calls
    /// serialize. If starting the new scheduler fails the old one is already
    /// stopped; no job will fire until a later call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidCron`] when the expression does not
    /// parse, or [`ScheduleError::Scheduler`] when the swap itself fails.
    pub async fn reconfigure(&self, cron: &str) -> Result<(), ScheduleError> {
        let job = self.build_ingest_job(cron)?;

        let mut guard = self.inner.lock().await;
        if let Some(mut old) = guard.take() {
            old.shutdown().await?;
        }

        let scheduler = JobScheduler::new().await?;
        scheduler.add(job).await?;
        scheduler.start().await?;
        *guard = Some(scheduler);

        tracing::info!(cron, "ingest schedule configured");
        Ok(())
    }

    fn build_ingest_job(&self, cron: &str) -> Result<Job, ScheduleError> {
        let pool = Arc::new(self.pool.clone());
        let config = Arc::clone(&self.config);

        Job::new_async(cron, move |_uuid, _lock| {
            let pool = Arc::clone(&pool);
            let config = Arc::clone(&config);

            Box::pin(async move {
                tracing::info!("scheduler: starting ingest sweep");
                run_ingest_sweep(&pool, &config).await;
                tracing::info!("scheduler: ingest sweep complete");
            })
        })
        .map_err(|source| ScheduleError::InvalidCron {
            cron: cron.to_string(),
            source,
        })
    }
}

/// Run one ingest cycle for every active advertiser, sequentially.
///
/// Per-advertiser failures are logged and never abort the sweep; each cycle
/// leaves its own `ingest_runs` row behind either way.
async fn run_ingest_sweep(pool: &PgPool, config: &AppConfig) {
    let advertisers = match adpulse_db::list_active_advertisers(pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load active advertisers");
            return;
        }
    };

    if advertisers.is_empty() {
        tracing::info!("scheduler: no active advertisers; skipping sweep");
        return;
    }

    let Some(token) = config.apify_token.as_deref() else {
        tracing::warn!("scheduler: APIFY_TOKEN not set; skipping ingest sweep");
        return;
    };

    let client = match AdLibraryClient::new(
        token,
        &config.apify_actor,
        config.scrape_request_timeout_secs,
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to build ad library client");
            return;
        }
    };

    tracing::info!(count = advertisers.len(), "scheduler: running ingest cycles");

    for advertiser in &advertisers {
        match run_cycle(
            pool,
            &client,
            advertiser,
            TriggerSource::Scheduler,
            config.scrape_raw_limit,
        )
        .await
        {
            Ok(report) => {
                tracing::info!(
                    advertiser = %advertiser.slug,
                    inserted = report.inserted,
                    updated = report.updated,
                    deleted = report.deleted,
                    "scheduler: cycle succeeded"
                );
            }
            Err(e) => {
                tracing::error!(
                    advertiser = %advertiser.slug,
                    error = %e,
                    "scheduler: cycle failed"
                );
            }
        }
    }
}
