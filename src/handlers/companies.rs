// handlers/companies.rs - /companies routes

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, ValidJson, ValidPath, ValidQuery};
use crate::models::{Company, CompanyDetail, CompanyFilter, CompanyUpdate, NewCompany};
use crate::server::AppState;

/// POST /companies - admin only
///
/// Body: `{ handle, name, description, numEmployees?, logoUrl? }`
/// Returns 201 `{ company }`.
pub async fn create(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewCompany>,
) -> ApiResult<Company> {
    let company = Company::create(&state.pool, payload).await?;
    Ok(ApiResponse::created("company", company))
}

/// GET /companies?name=&minEmployees=&maxEmployees=
///
/// Returns `{ companies: [...] }` ordered by name.
pub async fn list(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<CompanyFilter>,
) -> ApiResult<Vec<Company>> {
    let companies = Company::find_all(&state.pool, &filter).await?;
    Ok(ApiResponse::success("companies", companies))
}

/// GET /companies/:handle - includes the company's jobs
pub async fn get(
    State(state): State<AppState>,
    ValidPath(handle): ValidPath<String>,
) -> ApiResult<CompanyDetail> {
    let company = Company::get(&state.pool, &handle).await?;
    Ok(ApiResponse::success("company", company))
}

/// PATCH /companies/:handle - admin only
///
/// Body may contain any of `{ name, description, numEmployees, logoUrl }`.
pub async fn update(
    State(state): State<AppState>,
    ValidPath(handle): ValidPath<String>,
    ValidJson(payload): ValidJson<CompanyUpdate>,
) -> ApiResult<Company> {
    let company = Company::update(&state.pool, &handle, payload).await?;
    Ok(ApiResponse::success("company", company))
}

/// DELETE /companies/:handle - admin only; returns `{ deleted: handle }`
pub async fn remove(
    State(state): State<AppState>,
    ValidPath(handle): ValidPath<String>,
) -> ApiResult<String> {
    Company::remove(&state.pool, &handle).await?;
    Ok(ApiResponse::success("deleted", handle))
}
