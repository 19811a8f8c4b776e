use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use service::risk::domain::{HeatCell, RiskFilter, RiskInput, RiskLevel, RiskStatistics, RiskStatus, RiskView};

use crate::context::TenantContext;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RiskQuery {
    pub category: Option<String>,
    /// e.g. `Under Assessment`, `under_assessment`
    pub status: Option<String>,
    /// `Low`, `Medium`, `High` or `Critical`
    pub level: Option<String>,
}

impl RiskQuery {
    fn into_filter(self) -> Result<RiskFilter, JsonApiError> {
        let nonblank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(RiskFilter {
            category: nonblank(self.category),
            status: nonblank(self.status).map(|s| s.parse::<RiskStatus>()).transpose()?,
            level: nonblank(self.level).map(|s| s.parse::<RiskLevel>()).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MitigateRequest {
    pub details: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/risks", get(list).post(create))
        .route("/api/risks/high", get(high))
        .route("/api/risks/statistics", get(statistics))
        .route("/api/risks/heatmap", get(heatmap))
        .route("/api/risks/:id", get(get_one).put(update).delete(remove))
        .route("/api/risks/:id/assess", post(assess))
        .route("/api/risks/:id/submit-decision", post(submit_decision))
        .route("/api/risks/:id/accept", post(accept))
        .route("/api/risks/:id/reject-acceptance", post(reject_acceptance))
        .route("/api/risks/:id/mitigate", post(mitigate))
        .route("/api/risks/:id/monitor", post(monitor))
        .route("/api/risks/:id/close", post(close))
        .route("/api/risks/:id/reopen", post(reopen))
}

#[utoipa::path(
    post, path = "/api/risks", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    request_body = crate::openapi::RiskInputDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation failed"))
)]
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(input): Json<RiskInput>,
) -> Result<(StatusCode, Json<RiskView>), JsonApiError> {
    let r = state.risks.create(ctx.tenant_id, &ctx.user, input).await?;
    Ok((StatusCode::CREATED, Json(r)))
}

#[utoipa::path(
    get, path = "/api/risks", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), RiskQuery),
    responses((status = 200, description = "OK"), (status = 400, description = "Bad filter"))
)]
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(q): Query<RiskQuery>,
) -> Result<Json<Vec<RiskView>>, JsonApiError> {
    let filter = q.into_filter()?;
    Ok(Json(state.risks.list(ctx.tenant_id, &filter).await?))
}

#[utoipa::path(
    get, path = "/api/risks/{id}", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.get(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    put, path = "/api/risks/{id}", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    request_body = crate::openapi::RiskInputDoc,
    responses((status = 200, description = "OK"), (status = 400, description = "Validation failed"), (status = 404, description = "Not found"))
)]
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(input): Json<RiskInput>,
) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.update(ctx.tenant_id, id, input).await?))
}

#[utoipa::path(
    delete, path = "/api/risks/{id}", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn remove(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.risks.delete(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/api/risks/high", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "High and critical risks"))
)]
pub async fn high(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<Vec<RiskView>>, JsonApiError> {
    Ok(Json(state.risks.high_risks(ctx.tenant_id).await?))
}

#[utoipa::path(
    get, path = "/api/risks/statistics", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "OK"))
)]
pub async fn statistics(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<RiskStatistics>, JsonApiError> {
    Ok(Json(state.risks.statistics(ctx.tenant_id).await?))
}

#[utoipa::path(
    get, path = "/api/risks/heatmap", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "25 likelihood x impact cells"))
)]
pub async fn heatmap(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<Vec<HeatCell>>, JsonApiError> {
    Ok(Json(state.risks.heatmap(ctx.tenant_id).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/assess", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "Under Assessment"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn assess(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.start_assessment(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/submit-decision", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "Pending Decision"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn submit_decision(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.submit_for_decision(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/accept", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "Accepted"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn accept(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.accept(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/reject-acceptance", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "Requires Mitigation"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn reject_acceptance(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.reject_acceptance(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/mitigate", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    request_body = MitigateRequest,
    responses((status = 200, description = "Mitigated"), (status = 400, description = "Missing details or illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn mitigate(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<MitigateRequest>,
) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.mitigate(ctx.tenant_id, id, &body.details).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/monitor", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "Monitoring"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn monitor(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.start_monitoring(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/close", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "Closed"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn close(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.close(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/risks/{id}/reopen", tag = "risks",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Risk id")),
    responses((status = 200, description = "Identified"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn reopen(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<RiskView>, JsonApiError> {
    Ok(Json(state.risks.reopen(ctx.tenant_id, id).await?))
}
