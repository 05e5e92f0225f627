use crate::api::ApiError;
use crate::job::{JobRequest, SessionPlan};
use crate::AppState;
use axum::{extract::rejection::JsonRejection, Extension, Json};
use std::sync::Arc;

/// Handler for `POST /api/jobs`.
///
/// Plans the session of a dispatched job. Outbound jobs are dialed before
/// the plan is returned. Body rejections are answered as `{"error": ...}`.
pub async fn create_job_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> Result<Json<SessionPlan>, ApiError> {
    let Json(request) = payload?;
    let plan = state.planner.plan(&request).await?;
    Ok(Json(plan))
}
