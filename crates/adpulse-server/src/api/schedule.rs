//! PUT /api/v1/schedule — replace the recurring ingest schedule.

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::scheduler::ScheduleError;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ScheduleRequest {
    pub cron: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ScheduleData {
    pub cron: String,
}

/// Swaps the running scheduler job for one on the supplied cron expression.
/// A cron that fails to parse leaves the existing schedule in place.
pub(in crate::api) async fn replace_schedule(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScheduleRequest>,
) -> Result<Json<ApiResponse<ScheduleData>>, ApiError> {
    let cron = body.cron.trim().to_owned();
    if cron.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "cron must not be empty",
        ));
    }

    match state.scheduler.reconfigure(&cron).await {
        Ok(()) => Ok(Json(ApiResponse {
            data: ScheduleData { cron },
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(err @ ScheduleError::InvalidCron { .. }) => {
            Err(ApiError::new(req_id.0, "validation_error", err.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to reconfigure ingest schedule");
            Err(ApiError::new(
                req_id.0,
                "internal_error",
                "failed to reconfigure schedule",
            ))
        }
    }
}
