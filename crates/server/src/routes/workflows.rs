use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use models::{workflow_instance, workflow_task};
use service::workflow::domain::{NewWorkflow, WorkflowView};
use service::workflow::InstanceStatus;

use crate::context::TenantContext;
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkflowQuery {
    /// e.g. `InProgress`
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InboxQuery {
    #[serde(default)]
    pub assignee: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskCommentsRequest {
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskRejectRequest {
    pub reason: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list).post(create))
        .route("/api/workflows/tasks", get(inbox))
        .route("/api/workflows/:id", get(get_one))
        .route("/api/workflows/:id/start", post(start))
        .route("/api/workflows/:id/suspend", post(suspend))
        .route("/api/workflows/:id/resume", post(resume))
        .route("/api/workflows/:id/cancel", post(cancel))
        .route("/api/workflows/:id/retry", post(retry))
        .route("/api/workflows/:id/tasks/:task_id/approve", post(approve_task))
        .route("/api/workflows/:id/tasks/:task_id/reject", post(reject_task))
        .route("/api/workflows/:id/tasks/:task_id/skip", post(skip_task))
}

#[utoipa::path(
    post, path = "/api/workflows", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant")),
    request_body = crate::openapi::NewWorkflowDoc,
    responses((status = 201, description = "Created as Pending"), (status = 400, description = "Validation failed"))
)]
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(input): Json<NewWorkflow>,
) -> Result<(StatusCode, Json<WorkflowView>), JsonApiError> {
    let wf = state.workflows.create(ctx.tenant_id, &ctx.user, input).await?;
    Ok((StatusCode::CREATED, Json(wf)))
}

#[utoipa::path(
    get, path = "/api/workflows", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), WorkflowQuery),
    responses((status = 200, description = "Newest first"), (status = 400, description = "Unknown status"))
)]
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(q): Query<WorkflowQuery>,
) -> Result<Json<Vec<workflow_instance::Model>>, JsonApiError> {
    let status = q.status.filter(|s| !s.trim().is_empty()).map(|s| s.parse::<InstanceStatus>()).transpose()?;
    Ok(Json(state.workflows.list(ctx.tenant_id, status).await?))
}

#[utoipa::path(
    get, path = "/api/workflows/tasks", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), InboxQuery),
    responses((status = 200, description = "Open tasks of the assignee"), (status = 400, description = "Missing assignee"))
)]
pub async fn inbox(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(q): Query<InboxQuery>,
) -> Result<Json<Vec<workflow_task::Model>>, JsonApiError> {
    Ok(Json(state.workflows.tasks_for(ctx.tenant_id, &q.assignee).await?))
}

#[utoipa::path(
    get, path = "/api/workflows/{id}", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Workflow id")),
    responses((status = 200, description = "Instance with tasks"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.get(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/start", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Workflow id")),
    responses((status = 200, description = "First task active"), (status = 400, description = "Not pending"), (status = 404, description = "Not found"))
)]
pub async fn start(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.start(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/suspend", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Workflow id")),
    responses((status = 200, description = "Suspended"), (status = 400, description = "Illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn suspend(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.suspend(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/resume", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Workflow id")),
    responses((status = 200, description = "InProgress"), (status = 400, description = "Not suspended"), (status = 404, description = "Not found"))
)]
pub async fn resume(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.resume(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/cancel", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Workflow id")),
    responses((status = 200, description = "Cancelled with its open tasks"), (status = 400, description = "Already finished"), (status = 404, description = "Not found"))
)]
pub async fn cancel(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.cancel(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/retry", tag = "workflows",
    params(("X-Tenant-Id" = Uuid, Header, description = "Tenant"), ("id" = Uuid, Path, description = "Workflow id")),
    responses((status = 200, description = "Back in progress"), (status = 400, description = "Not rejected or failed"), (status = 404, description = "Not found"))
)]
pub async fn retry(State(state): State<AppState>, ctx: TenantContext, Path(id): Path<Uuid>) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.retry(ctx.tenant_id, id).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/tasks/{task_id}/approve", tag = "workflows",
    params(
        ("X-Tenant-Id" = Uuid, Header, description = "Tenant"),
        ("id" = Uuid, Path, description = "Workflow id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    request_body(content = TaskCommentsRequest, description = "Optional"),
    responses((status = 200, description = "Approved"), (status = 400, description = "Workflow not running or illegal status change"), (status = 404, description = "Not found"))
)]
pub async fn approve_task(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
    body: Option<Json<TaskCommentsRequest>>,
) -> Result<Json<WorkflowView>, JsonApiError> {
    let comments = body.as_ref().and_then(|Json(b)| b.comments.as_deref());
    Ok(Json(state.workflows.approve_task(ctx.tenant_id, id, task_id, &ctx.user, comments).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/tasks/{task_id}/reject", tag = "workflows",
    params(
        ("X-Tenant-Id" = Uuid, Header, description = "Tenant"),
        ("id" = Uuid, Path, description = "Workflow id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    request_body = TaskRejectRequest,
    responses((status = 200, description = "Workflow rejected"), (status = 400, description = "Missing reason or workflow not running"), (status = 404, description = "Not found"))
)]
pub async fn reject_task(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<TaskRejectRequest>,
) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.reject_task(ctx.tenant_id, id, task_id, &ctx.user, &body.reason).await?))
}

#[utoipa::path(
    post, path = "/api/workflows/{id}/tasks/{task_id}/skip", tag = "workflows",
    params(
        ("X-Tenant-Id" = Uuid, Header, description = "Tenant"),
        ("id" = Uuid, Path, description = "Workflow id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    responses((status = 200, description = "Skipped"), (status = 400, description = "Workflow not running or task already started"), (status = 404, description = "Not found"))
)]
pub async fn skip_task(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WorkflowView>, JsonApiError> {
    Ok(Json(state.workflows.skip_task(ctx.tenant_id, id, task_id, &ctx.user).await?))
}
