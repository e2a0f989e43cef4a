use axum::extract::{Query, State};
use axum::Json;

use crate::app_state::AppState;
use crate::error::ApiResult;
use crate::models::request::{WorkerRunQuery, WorkerRunResponse};
use crate::services::worker::parse_limit;

/// GET|POST /api/v1/worker/run - process one batch of pending items.
///
/// Item failures are reported in the body; only store failures produce an
/// error status. Access control belongs to the deployment.
pub async fn run_worker(
    State(state): State<AppState>,
    Query(query): Query<WorkerRunQuery>,
) -> ApiResult<Json<WorkerRunResponse>> {
    let response = state.worker.run(parse_limit(query.limit.as_deref())).await?;
    Ok(Json(response))
}
