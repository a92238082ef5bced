//! Ad-level handlers: the bookmark toggle and weekly rank history.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use adpulse_core::AiTags;
use adpulse_db::AdRow;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// One stored ad as the API presents it.
#[derive(Debug, Serialize)]
pub(in crate::api) struct AdItem {
    pub ad_id: String,
    pub rank: i32,
    pub creative_type: String,
    pub creative_url: Option<String>,
    pub video_url: Option<String>,
    pub ad_copy: Option<String>,
    pub headline: Option<String>,
    pub cta_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub ad_library_link: Option<String>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub weeks_in_top10: i32,
    pub bookmarked: bool,
    pub tags: Option<AiTags>,
}

impl AdItem {
    pub(in crate::api) fn from_row(row: AdRow) -> Self {
        let tags = row.ai_tags();
        Self {
            ad_id: row.ad_id,
            rank: row.rank,
            creative_type: row.creative_type,
            creative_url: row.creative_url,
            video_url: row.video_url,
            ad_copy: row.ad_copy,
            headline: row.headline,
            cta_type: row.cta_type,
            start_date: row.start_date,
            ad_library_link: row.ad_library_link,
            first_seen: row.first_seen,
            last_seen: row.last_seen,
            weeks_in_top10: row.weeks_in_top10,
            bookmarked: row.bookmarked,
            tags,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct BookmarkRequest {
    pub bookmarked: bool,
}

/// PATCH /api/v1/ads/{ad_id}/bookmark — set or clear the deletion shield.
pub(in crate::api) async fn set_ad_bookmark(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(ad_id): Path<String>,
    Json(body): Json<BookmarkRequest>,
) -> Result<Json<ApiResponse<AdItem>>, ApiError> {
    let row = adpulse_db::set_bookmark(&state.pool, &ad_id, body.bookmarked)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: AdItem::from_row(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// One week of an ad's rank history.
#[derive(Debug, Serialize)]
pub(in crate::api) struct SnapshotItem {
    pub week_start: NaiveDate,
    pub rank: i32,
}

/// GET /api/v1/ads/{ad_id}/history — weekly rank snapshots, oldest first.
pub(in crate::api) async fn list_ad_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(ad_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<SnapshotItem>>>, ApiError> {
    let ad = adpulse_db::get_ad(&state.pool, &ad_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if ad.is_none() {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no ad with id '{ad_id}'"),
        ));
    }

    let snapshots = adpulse_db::list_snapshots_for_ad(&state.pool, &ad_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = snapshots
        .into_iter()
        .map(|s| SnapshotItem {
            week_start: s.week_start,
            rank: s.rank,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
