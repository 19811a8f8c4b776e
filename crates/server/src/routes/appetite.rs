use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use service::appetite::domain::{AppetiteSummary, Comparison, SettingInput, SettingView};

use crate::context::TenantContext;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SettingQuery {
    #[serde(default)]
    pub active_only: bool,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompareQuery {
    pub category: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/risk-appetite", get(list).post(create))
        .route("/api/risk-appetite/compare", get(compare))
        .route("/api/risk-appetite/summary", get(summary))
        .route("/api/risk-appetite/:id", get(get_one).put(update).delete(remove))
        .route("/api/risk-appetite/:id/approve", post(approve))
}

fn category_param(c: &Option<String>) -> Option<&str> {
    c.as_deref().map(str::trim).filter(|c| !c.is_empty())
}

#[utoipa::path(
    post, path = "/api/risk-appetite", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    request_body = crate::openapi::SettingInputDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation failed"), (status = 409, description = "Duplicate or second active setting"))
)]
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(input): Json<SettingInput>,
) -> Result<(StatusCode, Json<SettingView>), JsonApiError> {
    let s = state.appetite.create(ctx.tenant_id, &ctx.user, input).await?;
    Ok((StatusCode::CREATED, Json(s)))
}

#[utoipa::path(
    get, path = "/api/risk-appetite", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), SettingQuery),
    responses((status = 200, description = "OK"))
)]
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(q): Query<SettingQuery>,
) -> Result<Json<Vec<SettingView>>, JsonApiError> {
    Ok(Json(state.appetite.list(ctx.tenant_id, q.active_only, category_param(&q.category)).await?))
}

#[utoipa::path(
    get, path = "/api/risk-appetite/{id}", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Setting id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<SettingView>, JsonApiError> {
    Ok(Json(state.appetite.get(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    put, path = "/api/risk-appetite/{id}", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Setting id")),
    request_body = crate::openapi::SettingInputDoc,
    responses((status = 200, description = "OK"), (status = 400, description = "Validation failed"), (status = 404, description = "Not found"), (status = 409, description = "Conflict"))
)]
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(input): Json<SettingInput>,
) -> Result<Json<SettingView>, JsonApiError> {
    Ok(Json(state.appetite.update(ctx.tenant_id, id, input).await?))
}

#[utoipa::path(
    delete, path = "/api/risk-appetite/{id}", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Setting id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn remove(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.appetite.delete(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/api/risk-appetite/{id}/approve", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Setting id")),
    responses((status = 200, description = "Approved and active"), (status = 404, description = "Not found"), (status = 409, description = "Another setting is active"))
)]
pub async fn approve(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<SettingView>, JsonApiError> {
    Ok(Json(state.appetite.approve(ctx.tenant_id, id, &ctx.user).await?))
}

#[utoipa::path(
    get, path = "/api/risk-appetite/compare", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), CompareQuery),
    responses((status = 200, description = "Risks against appetite, largest deviation first"))
)]
pub async fn compare(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(q): Query<CompareQuery>,
) -> Result<Json<Vec<Comparison>>, JsonApiError> {
    Ok(Json(state.appetite.compare(ctx.tenant_id, category_param(&q.category)).await?))
}

#[utoipa::path(
    get, path = "/api/risk-appetite/summary", tag = "appetite",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "OK"))
)]
pub async fn summary(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<AppetiteSummary>, JsonApiError> {
    Ok(Json(state.appetite.summary(ctx.tenant_id).await?))
}
