use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::tenant;
use service::tenant::TenantStatus;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTenantRequest {
    pub name: String,
    pub admin_email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub admin_email: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tenants", get(list).post(create))
        .route("/api/tenants/by-slug/:slug", get(get_by_slug))
        .route("/api/tenants/:id", get(get_one).put(update))
        .route("/api/tenants/:id/activate", post(activate))
        .route("/api/tenants/:id/suspend", post(suspend))
}

#[utoipa::path(
    post, path = "/api/tenants", tag = "tenants",
    request_body = CreateTenantRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation failed"), (status = 409, description = "Slug conflict"))
)]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<tenant::Model>), JsonApiError> {
    let t = state.tenants.create(&input.name, &input.admin_email).await?;
    Ok((StatusCode::CREATED, Json(t)))
}

#[utoipa::path(
    get, path = "/api/tenants", tag = "tenants",
    params(("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "Page size, at most 100")),
    responses((status = 200, description = "OK"))
)]
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<tenant::Model>>, JsonApiError> {
    Ok(Json(state.tenants.list(page).await?))
}

#[utoipa::path(
    get, path = "/api/tenants/{id}", tag = "tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<tenant::Model>, JsonApiError> {
    Ok(Json(state.tenants.get(id).await?))
}

#[utoipa::path(
    get, path = "/api/tenants/by-slug/{slug}", tag = "tenants",
    params(("slug" = String, Path, description = "Tenant slug")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<tenant::Model>, JsonApiError> {
    Ok(Json(state.tenants.get_by_slug(&slug).await?))
}

#[utoipa::path(
    put, path = "/api/tenants/{id}", tag = "tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    request_body = UpdateTenantRequest,
    responses((status = 200, description = "OK"), (status = 400, description = "Validation failed"), (status = 404, description = "Not found"))
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTenantRequest>,
) -> Result<Json<tenant::Model>, JsonApiError> {
    let t = state.tenants.update(id, input.name.as_deref(), input.admin_email.as_deref()).await?;
    Ok(Json(t))
}

#[utoipa::path(
    post, path = "/api/tenants/{id}/activate", tag = "tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    responses((status = 200, description = "OK"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn activate(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<tenant::Model>, JsonApiError> {
    Ok(Json(state.tenants.set_status(id, TenantStatus::Active).await?))
}

#[utoipa::path(
    post, path = "/api/tenants/{id}/suspend", tag = "tenants",
    params(("id" = Uuid, Path, description = "Tenant id")),
    responses((status = 200, description = "OK"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn suspend(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<tenant::Model>, JsonApiError> {
    Ok(Json(state.tenants.set_status(id, TenantStatus::Suspended).await?))
}
