//! Database operations for the `ingest_runs` table.
//!
//! One row per ingest cycle per advertiser. Status transitions are guarded
//! in SQL (`queued -> running -> succeeded|failed`); a transition from the
//! wrong state affects zero rows and surfaces as a typed error.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `ingest_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub advertiser_id: i64,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ads_processed: i32,
    pub inserted_count: i32,
    pub updated_count: i32,
    pub deleted_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A run joined with its advertiser's slug, shaped for the recent-activity
/// listing. Carries no internal row ids.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunListRow {
    pub public_id: Uuid,
    pub advertiser_slug: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ads_processed: i32,
    pub inserted_count: i32,
    pub updated_count: i32,
    pub deleted_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Creates a new ingest run in `queued` status.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_ingest_run(
    pool: &PgPool,
    advertiser_id: i64,
    trigger_source: &str,
) -> Result<IngestRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, IngestRunRow>(
        "INSERT INTO ingest_runs (public_id, advertiser_id, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING id, public_id, advertiser_id, trigger_source, status, \
                   started_at, completed_at, ads_processed, inserted_count, \
                   updated_count, deleted_count, error_message, created_at",
    )
    .bind(public_id)
    .bind(advertiser_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `queued`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_ingest_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded`, sets `completed_at = NOW()` and the cycle's
/// reconciliation counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_ingest_run(
    pool: &PgPool,
    id: i64,
    ads_processed: i32,
    inserted_count: i32,
    updated_count: i32,
    deleted_count: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'succeeded', completed_at = NOW(), ads_processed = $1, \
             inserted_count = $2, updated_count = $3, deleted_count = $4 \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(ads_processed)
    .bind(inserted_count)
    .bind(updated_count)
    .bind(deleted_count)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, sets `completed_at = NOW()` and `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_ingest_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_ingest_run(pool: &PgPool, id: i64) -> Result<IngestRunRow, DbError> {
    let row = sqlx::query_as::<_, IngestRunRow>(
        "SELECT id, public_id, advertiser_id, trigger_source, status, \
                started_at, completed_at, ads_processed, inserted_count, \
                updated_count, deleted_count, error_message, created_at \
         FROM ingest_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs joined with each run's advertiser
/// slug, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ingest_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<IngestRunListRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestRunListRow>(
        "SELECT ir.public_id, a.slug AS advertiser_slug, ir.trigger_source, \
                ir.status, ir.started_at, ir.completed_at, ir.ads_processed, \
                ir.inserted_count, ir.updated_count, ir.deleted_count, \
                ir.error_message, ir.created_at \
         FROM ingest_runs ir \
         JOIN advertisers a ON a.id = ir.advertiser_id \
         ORDER BY ir.created_at DESC, ir.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
