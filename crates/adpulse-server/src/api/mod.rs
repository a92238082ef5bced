//! HTTP API surface.
//!
//! All endpoints live under `/api/v1` and share a common response envelope:
//! successful responses wrap their payload in [`ApiResponse`] and errors come
//! back as [`ApiError`] with a machine-readable code. Every response carries
//! the request id assigned by the [`crate::middleware::request_id`] layer.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use adpulse_core::AppConfig;

use crate::middleware::{request_id, RequestId};
use crate::scheduler::IngestScheduler;

mod ads;
mod advertisers;
mod runs;
mod schedule;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: Arc<AppConfig>,
    pub scheduler: Arc<IngestScheduler>,
}

/// Envelope for successful responses.
#[derive(Debug, Serialize)]
pub(in crate::api) struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    pub(in crate::api) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

/// Envelope for error responses.
#[derive(Debug, Serialize)]
pub(in crate::api) struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub(in crate::api) fn new(
        request_id: String,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" => StatusCode::CONFLICT,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Translates a database error into an API error, logging anything that is
/// not a plain missing-row case.
pub(in crate::api) fn map_db_error(request_id: String, err: &adpulse_db::DbError) -> ApiError {
    match err {
        adpulse_db::DbError::NotFound => {
            ApiError::new(request_id, "not_found", "resource not found")
        }
        other => {
            tracing::error!(error = %other, "database error while serving request");
            ApiError::new(request_id, "internal_error", "internal server error")
        }
    }
}

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Clamps a caller-supplied `limit` into `1..=200`, defaulting to 50.
pub(in crate::api) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-request-id"),
        ])
}

/// Assembles the full router with CORS and request-id layers applied.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/advertisers", get(advertisers::list_advertisers))
        .route(
            "/api/v1/advertisers/{slug}/ads",
            get(advertisers::list_advertiser_ads),
        )
        .route(
            "/api/v1/advertisers/{slug}/ingest",
            post(advertisers::trigger_ingest),
        )
        .route("/api/v1/ads/{ad_id}/bookmark", patch(ads::set_ad_bookmark))
        .route("/api/v1/ads/{ad_id}/history", get(ads::list_ad_history))
        .route("/api/v1/ingest-runs", get(runs::list_runs))
        .route("/api/v1/schedule", put(schedule::replace_schedule))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

/// GET /api/v1/health — 200 when the database answers, 503 otherwise.
async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    match adpulse_db::health_check(&state.pool).await {
        Ok(()) => {
            let body = ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta: ResponseMeta::new(req_id.0),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "health check failed");
            let body = ApiResponse {
                data: HealthData {
                    status: "degraded",
                    database: "unreachable",
                },
                meta: ResponseMeta::new(req_id.0),
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}
