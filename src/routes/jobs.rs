use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::job::{ItemStatus, ItemView, Job};
use crate::models::request::{EnqueueRequest, EnqueueResponse, ItemListQuery, JobListQuery};
use crate::services::enqueue::Caller;
use crate::services::worker::{clamp_limit, parse_limit};

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// POST /api/v1/jobs - create a job with one pending item per usable offer.
pub async fn create_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let caller = Caller {
        user_id: header(&headers, "x-user-id"),
        enterprise_id: header(&headers, "x-enterprise-id"),
    };

    let response = state.enqueue.enqueue(request, caller).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/jobs - most recent jobs first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    let limit = clamp_limit(parse_limit(query.limit.as_deref()));
    let jobs = state.store.list_jobs(limit).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/{job_id} - job summary.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    let job = state
        .store
        .get_job(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job {job_id}")))?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/{job_id}/items - items of a job, optionally by status.
pub async fn list_job_items(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Json<Vec<ItemView>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<ItemStatus>()
                .map_err(|_| ApiError::bad_request(format!("unknown item status '{s}'")))
        })
        .transpose()?;

    if state.store.get_job(job_id).await?.is_none() {
        return Err(ApiError::not_found(format!("job {job_id}")));
    }

    let items = state.store.list_items(job_id, status).await?;
    Ok(Json(items.into_iter().map(ItemView::from).collect()))
}
