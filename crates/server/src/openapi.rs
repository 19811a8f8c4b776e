//! OpenAPI document. The `*Doc` types mirror request bodies owned by the
//! service crate, which stays free of utoipa.

use chrono::{DateTime, Utc};
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::routes::{appetite, catalog, diagnostics, evidence, risks, tenants, workflows};

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct NewRegulatorDoc {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
}

#[derive(ToSchema)]
pub struct NewFrameworkDoc {
    pub regulator_code: String,
    pub code: String,
    pub title: String,
    pub version: String,
    pub is_mandatory: Option<bool>,
}

#[derive(ToSchema)]
pub struct NewControlDoc {
    pub framework_code: String,
    pub control_number: String,
    pub domain: String,
    pub title: String,
    pub requirement: String,
    /// `Preventive`, `Detective` or `Corrective`
    pub control_type: String,
    /// 1..=5
    pub maturity_level: i32,
    pub evidence_requirements: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(ToSchema)]
pub struct RiskInputDoc {
    pub title: String,
    pub description: String,
    pub category: String,
    /// 1..=5
    pub likelihood: i32,
    /// 1..=5
    pub impact: i32,
    pub owner: String,
    /// Required once likelihood x impact reaches the configured threshold
    pub mitigation_strategy: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(ToSchema)]
pub struct SettingInputDoc {
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub minimum_risk_score: i32,
    pub maximum_risk_score: i32,
    pub target_risk_score: i32,
    pub tolerance_percentage: i32,
    pub impact_threshold: i32,
    pub likelihood_threshold: i32,
    pub expiry_date: Option<DateTime<Utc>>,
    pub review_reminder_days: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(ToSchema)]
pub struct EvidenceInputDoc {
    pub control_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub evidence_type: String,
    pub file_url: Option<String>,
    pub collected_at: Option<DateTime<Utc>>,
}

#[derive(ToSchema)]
pub struct NewTaskDoc {
    pub name: String,
    pub assignee: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(ToSchema)]
pub struct NewWorkflowDoc {
    pub definition_key: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub tasks: Vec<NewTaskDoc>,
}

#[derive(ToSchema)]
pub struct VisitorInputDoc {
    pub session_id: Option<String>,
    pub page: String,
    pub action: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(ToSchema)]
pub struct ErrorInputDoc {
    pub session_id: Option<String>,
    pub page: String,
    pub message: String,
    pub stack_trace: Option<String>,
    pub error_type: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::observability::metrics,
        tenants::create,
        tenants::list,
        tenants::get_one,
        tenants::get_by_slug,
        tenants::update,
        tenants::activate,
        tenants::suspend,
        catalog::create_regulator,
        catalog::list_regulators,
        catalog::get_regulator,
        catalog::deactivate_regulator,
        catalog::create_framework,
        catalog::list_frameworks,
        catalog::get_framework,
        catalog::create_control,
        catalog::list_controls,
        catalog::search_controls,
        catalog::get_control,
        catalog::statistics,
        risks::create,
        risks::list,
        risks::get_one,
        risks::update,
        risks::remove,
        risks::high,
        risks::statistics,
        risks::heatmap,
        risks::assess,
        risks::submit_decision,
        risks::accept,
        risks::reject_acceptance,
        risks::mitigate,
        risks::monitor,
        risks::close,
        risks::reopen,
        appetite::create,
        appetite::list,
        appetite::get_one,
        appetite::update,
        appetite::remove,
        appetite::approve,
        appetite::compare,
        appetite::summary,
        evidence::submit,
        evidence::list,
        evidence::get_one,
        evidence::submit_for_review,
        evidence::start_review,
        evidence::request_changes,
        evidence::resubmit,
        evidence::score,
        evidence::scores,
        evidence::approve,
        evidence::reject,
        evidence::archive,
        evidence::compliance,
        evidence::statistics,
        workflows::create,
        workflows::list,
        workflows::inbox,
        workflows::get_one,
        workflows::start,
        workflows::suspend,
        workflows::resume,
        workflows::cancel,
        workflows::retry,
        workflows::approve_task,
        workflows::reject_task,
        workflows::skip_task,
        diagnostics::record_visitor,
        diagnostics::record_error,
        diagnostics::get_error,
        diagnostics::analytics,
        diagnostics::export,
        diagnostics::health,
    ),
    components(
        schemas(
            HealthResponse,
            NewRegulatorDoc,
            NewFrameworkDoc,
            NewControlDoc,
            RiskInputDoc,
            SettingInputDoc,
            EvidenceInputDoc,
            NewTaskDoc,
            NewWorkflowDoc,
            VisitorInputDoc,
            ErrorInputDoc,
            tenants::CreateTenantRequest,
            tenants::UpdateTenantRequest,
            risks::MitigateRequest,
            evidence::CommentsRequest,
            evidence::RequestChangesRequest,
            evidence::ScoreRequest,
            evidence::RejectRequest,
            workflows::TaskCommentsRequest,
            workflows::TaskRejectRequest,
            diagnostics::Recorded,
        )
    ),
    tags(
        (name = "platform", description = "Health, metrics"),
        (name = "tenants", description = "Tenant onboarding"),
        (name = "catalog", description = "Regulators, frameworks and controls"),
        (name = "risks", description = "Risk register"),
        (name = "appetite", description = "Risk appetite settings"),
        (name = "evidence", description = "Evidence review and scoring"),
        (name = "workflows", description = "Approval workflows"),
        (name = "diagnostics", description = "Client visitor and error events")
    )
)]
pub struct ApiDoc;
