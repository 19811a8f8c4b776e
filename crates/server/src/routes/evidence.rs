use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use models::{evidence, evidence_score};
use service::evidence::domain::{ControlCompliance, EvidenceFilter, EvidenceInput, EvidenceStatistics};
use service::evidence::service::ScoreOutcome;
use service::evidence::EvidenceStatus;

use crate::context::TenantContext;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EvidenceQuery {
    pub control_id: Option<Uuid>,
    /// e.g. `InReview`
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CommentsRequest {
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestChangesRequest {
    pub comments: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreRequest {
    /// 0..=100
    pub score: i32,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub reason: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/evidence", get(list).post(submit))
        .route("/api/evidence/statistics", get(statistics))
        .route("/api/evidence/compliance/:control_id", get(compliance))
        .route("/api/evidence/:id", get(get_one))
        .route("/api/evidence/:id/submit-for-review", post(submit_for_review))
        .route("/api/evidence/:id/start-review", post(start_review))
        .route("/api/evidence/:id/request-changes", post(request_changes))
        .route("/api/evidence/:id/resubmit", post(resubmit))
        .route("/api/evidence/:id/score", post(score))
        .route("/api/evidence/:id/scores", get(scores))
        .route("/api/evidence/:id/approve", post(approve))
        .route("/api/evidence/:id/reject", post(reject))
        .route("/api/evidence/:id/archive", post(archive))
}

fn comments_of(body: &Option<Json<CommentsRequest>>) -> Option<&str> {
    body.as_ref().and_then(|Json(b)| b.comments.as_deref())
}

#[utoipa::path(
    post, path = "/api/evidence", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    request_body = crate::openapi::EvidenceInputDoc,
    responses((status = 201, description = "Created as Draft"), (status = 400, description = "Validation failed"), (status = 404, description = "Control not found"))
)]
pub async fn submit(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(input): Json<EvidenceInput>,
) -> Result<(StatusCode, Json<evidence::Model>), JsonApiError> {
    if let Some(control_id) = input.control_id {
        state.catalog.get_control(control_id).await?;
    }
    let e = state.evidence.submit(ctx.tenant_id, &ctx.user, input).await?;
    Ok((StatusCode::CREATED, Json(e)))
}

#[utoipa::path(
    get, path = "/api/evidence", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), EvidenceQuery),
    responses((status = 200, description = "OK"), (status = 400, description = "Unknown status"))
)]
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(q): Query<EvidenceQuery>,
) -> Result<Json<Vec<evidence::Model>>, JsonApiError> {
    let status = q.status.filter(|s| !s.trim().is_empty()).map(|s| s.parse::<EvidenceStatus>()).transpose()?;
    let filter = EvidenceFilter { control_id: q.control_id, status };
    Ok(Json(state.evidence.list(ctx.tenant_id, &filter).await?))
}

#[utoipa::path(
    get, path = "/api/evidence/{id}", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.get(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/submit-for-review", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    responses((status = 200, description = "Submitted"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn submit_for_review(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.submit_for_review(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/start-review", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    responses((status = 200, description = "InReview, reviewer is the acting user"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn start_review(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.start_review(ctx.tenant_id, id, &ctx.user).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/request-changes", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    request_body = RequestChangesRequest,
    responses((status = 200, description = "ChangesRequested"), (status = 400, description = "Missing comments or illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn request_changes(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<RequestChangesRequest>,
) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.request_changes(ctx.tenant_id, id, &ctx.user, &body.comments).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/resubmit", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    request_body(content = CommentsRequest, description = "Optional"),
    responses((status = 200, description = "Back in review"), (status = 400, description = "Not awaiting changes"), (status = 404, description = "Not found"))
)]
pub async fn resubmit(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    body: Option<Json<CommentsRequest>>,
) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.resubmit(ctx.tenant_id, id, comments_of(&body)).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/score", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    request_body = ScoreRequest,
    responses((status = 200, description = "Score stored as final"), (status = 400, description = "Score out of range"), (status = 404, description = "Not found"))
)]
pub async fn score(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ScoreRequest>,
) -> Result<Json<ScoreOutcome>, JsonApiError> {
    let out = state.evidence.score(ctx.tenant_id, id, &ctx.user, body.score, body.comments.as_deref()).await?;
    Ok(Json(out))
}

#[utoipa::path(
    get, path = "/api/evidence/{id}/scores", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    responses((status = 200, description = "Newest first"), (status = 404, description = "Not found"))
)]
pub async fn scores(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<evidence_score::Model>>, JsonApiError> {
    Ok(Json(state.evidence.score_history(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/approve", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    request_body(content = CommentsRequest, description = "Optional"),
    responses((status = 200, description = "Approved"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn approve(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    body: Option<Json<CommentsRequest>>,
) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.approve(ctx.tenant_id, id, &ctx.user, comments_of(&body)).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/reject", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    request_body = RejectRequest,
    responses((status = 200, description = "Rejected"), (status = 400, description = "Missing reason or illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn reject(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.reject(ctx.tenant_id, id, &ctx.user, &body.reason).await?))
}

#[utoipa::path(
    post, path = "/api/evidence/{id}/archive", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Evidence id")),
    responses((status = 200, description = "Archived"), (status = 400, description = "Only approved evidence can be archived"), (status = 404, description = "Not found"))
)]
pub async fn archive(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<evidence::Model>, JsonApiError> {
    Ok(Json(state.evidence.archive(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    get, path = "/api/evidence/compliance/{control_id}", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("control_id" = Uuid, Path, description = "Control id")),
    responses((status = 200, description = "Compliance derived from approved evidence scores"))
)]
pub async fn compliance(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(control_id): Path<Uuid>,
) -> Result<Json<ControlCompliance>, JsonApiError> {
    Ok(Json(state.evidence.control_compliance(ctx.tenant_id, control_id).await?))
}

#[utoipa::path(
    get, path = "/api/evidence/statistics", tag = "evidence",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    responses((status = 200, description = "OK"))
)]
pub async fn statistics(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<EvidenceStatistics>, JsonApiError> {
    Ok(Json(state.evidence.statistics(ctx.tenant_id).await?))
}
