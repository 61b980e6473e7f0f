// handlers/jobs.rs - /jobs routes

use axum::extract::State;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidJson, ValidPath, ValidQuery};
use crate::models::{Job, JobFilter, JobUpdate, NewJob};
use crate::server::AppState;

/// POST /jobs - admin only
///
/// Body: `{ title, salary?, equity?, companyHandle }`
/// Returns 201 `{ job }` including the generated id.
pub async fn create(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewJob>,
) -> ApiResult<Job> {
    let job = Job::create(&state.pool, payload).await?;
    Ok(ApiResponse::created("job", job))
}

/// GET /jobs?title=&minSalary=&maxSalary=&hasEquity=
pub async fn list(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<JobFilter>,
) -> ApiResult<Vec<Job>> {
    let jobs = Job::find_all(&state.pool, &filter).await?;
    Ok(ApiResponse::success("jobs", jobs))
}

/// GET /jobs/:id
pub async fn get(State(state): State<AppState>, ValidPath(id): ValidPath<String>) -> ApiResult<Job> {
    let job = Job::get(&state.pool, job_id(&id)?).await?;
    Ok(ApiResponse::success("job", job))
}

/// PATCH /jobs/:id - admin only; `{ title, salary, equity }`, any subset
pub async fn update(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
    ValidJson(payload): ValidJson<JobUpdate>,
) -> ApiResult<Job> {
    let job = Job::update(&state.pool, job_id(&id)?, payload).await?;
    Ok(ApiResponse::success("job", job))
}

/// DELETE /jobs/:id - admin only; returns `{ deleted: "<id>" }`
pub async fn remove(State(state): State<AppState>, ValidPath(id): ValidPath<String>) -> ApiResult<String> {
    let id = job_id(&id)?;
    Job::remove(&state.pool, id).await?;
    Ok(ApiResponse::success("deleted", id.to_string()))
}

/// Ids are `SERIAL`; anything that is not an `i32` names no job.
fn job_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(format!("No job: {}", raw)))
}
