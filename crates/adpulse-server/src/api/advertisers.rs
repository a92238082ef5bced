//! Advertiser handlers: the registry listing, per-advertiser ads, and the
//! on-demand ingest trigger.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use adpulse_db::AdvertiserRow;
use adpulse_ingest::{run_cycle, TriggerSource};
use adpulse_scraper::AdLibraryClient;

use crate::middleware::RequestId;

use super::ads::AdItem;
use super::runs::IngestRunItem;
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// One advertiser as the API presents it. Internal row ids stay internal;
/// callers see the public UUID.
#[derive(Debug, Serialize)]
pub(in crate::api) struct AdvertiserItem {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub page_id: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

impl AdvertiserItem {
    fn from_row(row: AdvertiserRow) -> Self {
        Self {
            id: row.public_id,
            slug: row.slug,
            name: row.name,
            page_id: row.page_id,
            notes: row.notes,
            is_active: row.is_active,
            last_scraped_at: row.last_scraped_at,
        }
    }
}

/// GET /api/v1/advertisers — all active advertisers, ordered by name.
pub(in crate::api) async fn list_advertisers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<AdvertiserItem>>>, ApiError> {
    let rows = adpulse_db::list_active_advertisers(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AdvertiserItem::from_row).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn resolve_advertiser(
    pool: &sqlx::PgPool,
    slug: &str,
    request_id: &str,
) -> Result<AdvertiserRow, ApiError> {
    adpulse_db::get_advertiser_by_slug(pool, slug)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                request_id.to_owned(),
                "not_found",
                format!("no advertiser with slug '{slug}'"),
            )
        })
}

/// GET /api/v1/advertisers/{slug}/ads — the advertiser's tracked ads by rank.
pub(in crate::api) async fn list_advertiser_ads(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Vec<AdItem>>>, ApiError> {
    let advertiser = resolve_advertiser(&state.pool, &slug, &req_id.0).await?;

    let rows = adpulse_db::get_ads_for_brand(&state.pool, advertiser.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AdItem::from_row).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct MergeErrorItem {
    pub ad_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct IngestTriggerData {
    pub run: IngestRunItem,
    pub merge_errors: Vec<MergeErrorItem>,
}

/// POST /api/v1/advertisers/{slug}/ingest — runs one ingest cycle inline and
/// returns the completed run's bookkeeping row.
///
/// Responds 503 when no provider token is configured: the deploy cannot
/// ingest at all, which is different from a cycle that ran and failed.
pub(in crate::api) async fn trigger_ingest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<IngestTriggerData>>), ApiError> {
    let advertiser = resolve_advertiser(&state.pool, &slug, &req_id.0).await?;

    let Some(token) = state.config.apify_token.as_deref() else {
        return Err(ApiError::new(
            req_id.0,
            "unavailable",
            "ingest is not configured: APIFY_TOKEN is unset",
        ));
    };

    let client = AdLibraryClient::new(
        token,
        &state.config.apify_actor,
        state.config.scrape_request_timeout_secs,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to build ad library client");
        ApiError::new(
            req_id.0.clone(),
            "internal_error",
            "failed to build scrape client",
        )
    })?;

    let report = run_cycle(
        &state.pool,
        &client,
        &advertiser,
        TriggerSource::Api,
        state.config.scrape_raw_limit,
    )
    .await
    .map_err(|e| {
        tracing::error!(advertiser = %slug, error = %e, "on-demand ingest cycle failed");
        ApiError::new(
            req_id.0.clone(),
            "internal_error",
            format!("ingest cycle failed: {e}"),
        )
    })?;

    let run = adpulse_db::get_ingest_run(&state.pool, report.run_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let merge_errors = report
        .merge_errors
        .into_iter()
        .map(|e| MergeErrorItem {
            ad_id: e.ad_id,
            message: e.message,
        })
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: IngestTriggerData {
                run: IngestRunItem::from_run_row(run, advertiser.slug),
                merge_errors,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
