//! GET /api/v1/ingest-runs — recent ingest cycle bookkeeping.

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adpulse_db::{IngestRunListRow, IngestRunRow};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// One ingest run as the API presents it. Internal row ids stay internal;
/// the advertiser is identified by slug.
#[derive(Debug, Serialize)]
pub(in crate::api) struct IngestRunItem {
    pub id: Uuid,
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

impl IngestRunItem {
    fn from_list_row(row: IngestRunListRow) -> Self {
        Self {
            id: row.public_id,
            advertiser_slug: row.advertiser_slug,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            ads_processed: row.ads_processed,
            inserted_count: row.inserted_count,
            updated_count: row.updated_count,
            deleted_count: row.deleted_count,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }

    /// For handlers that hold a full bookkeeping row and already know which
    /// advertiser it belongs to.
    pub(in crate::api) fn from_run_row(row: IngestRunRow, advertiser_slug: String) -> Self {
        Self {
            id: row.public_id,
            advertiser_slug,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            ads_processed: row.ads_processed,
            inserted_count: row.inserted_count,
            updated_count: row.updated_count,
            deleted_count: row.deleted_count,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct RunsQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/ingest-runs — newest first, `limit` clamped to `1..=200`.
pub(in crate::api) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<IngestRunItem>>>, ApiError> {
    let limit = normalize_limit(query.limit);

    let rows = adpulse_db::list_ingest_runs(&state.pool, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(IngestRunItem::from_list_row).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
