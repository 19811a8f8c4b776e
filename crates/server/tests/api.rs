//! Router-level tests against in-memory repositories.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use configs::AppConfig;
use server::{build_router, AppState};

fn app() -> Router {
    let state = AppState::in_memory(&AppConfig::default());
    build_router(state, tower_http::cors::CorsLayer::very_permissive())
}

async fn send(app: &Router, method: &str, uri: &str, tenant: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri).header("x-user", "auditor");
    if let Some(t) = tenant {
        req = req.header("x-tenant-id", t.to_string());
    }
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, value)
}

/// Register a tenant and return its id for the tenant header.
async fn onboard(app: &Router, name: &str) -> Option<Uuid> {
    let (status, t) = send(app, "POST", "/api/tenants", None, Some(json!({"name": name, "admin_email": "grc@example.com"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    Some(t["id"].as_str().unwrap().parse().unwrap())
}

fn risk_body(likelihood: i32, impact: i32) -> Value {
    json!({
        "title": "Vendor outage",
        "description": "Primary payment processor unavailable",
        "category": "Operational",
        "likelihood": likelihood,
        "impact": impact,
        "owner": "ops",
        "mitigation_strategy": "secondary processor"
    })
}

#[tokio::test]
async fn health_and_metrics() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let res = app.clone().oneshot(Request::get("/metrics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/risks"].is_object());
}

#[tokio::test]
async fn tenant_scoped_routes_require_tenant_header() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/risks", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "TENANT_REQUIRED");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_tenant_is_not_found() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/risks", Some(Uuid::new_v4()), Some(risk_body(2, 3))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");
    let (status, _) = send(&app, "GET", "/api/evidence", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tenant_onboarding_over_http() {
    let app = app();
    let body = json!({"name": "Acme Holdings", "admin_email": "owner@acme.example"});
    let (status, t) = send(&app, "POST", "/api/tenants", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(t["slug"], "acme-holdings");
    assert_eq!(t["status"], "Pending");
    let id = t["id"].as_str().unwrap().to_string();

    let (status, again) = send(&app, "POST", "/api/tenants", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(again["slug"].as_str().unwrap().starts_with("acme-holdings-"));

    let (status, body) = send(&app, "POST", "/api/tenants", None, Some(json!({"name": "X", "admin_email": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_FAILED");

    let (_, found) = send(&app, "GET", "/api/tenants/by-slug/acme-holdings", None, None).await;
    assert_eq!(found["id"], id.as_str());
    let (status, _) = send(&app, "GET", &format!("/api/tenants/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", &format!("/api/tenants/{id}/suspend"), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_STATE");
    let (_, t) = send(&app, "POST", &format!("/api/tenants/{id}/activate"), None, None).await;
    assert_eq!(t["status"], "Active");
    let (_, t) = send(&app, "PUT", &format!("/api/tenants/{id}"), None, Some(json!({"name": "Acme Group"}))).await;
    assert_eq!(t["name"], "Acme Group");
    assert_eq!(t["slug"], "acme-holdings");

    let (_, page) = send(&app, "GET", "/api/tenants?per_page=1", None, None).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["total_pages"], 2);
}

#[tokio::test]
async fn catalog_and_evidence_for_control() {
    let app = app();
    let (status, reg) = send(&app, "POST", "/api/catalog/regulators", None, Some(json!({"code": "nca", "name": "National Cybersecurity Authority"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reg["code"], "NCA");
    assert_eq!(reg["region_type"], "saudi");
    let (status, body) = send(&app, "POST", "/api/catalog/regulators", None, Some(json!({"code": "NCA", "name": "Again"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "CONFLICT");

    let framework = json!({"regulator_code": "NCA", "code": "ECC", "title": "Essential Cybersecurity Controls", "version": "2.0", "is_mandatory": true});
    let (status, _) = send(&app, "POST", "/api/catalog/frameworks", None, Some(framework)).await;
    assert_eq!(status, StatusCode::CREATED);

    let control = |number: &str| {
        json!({
            "framework_code": "ECC",
            "control_number": number,
            "domain": "Cybersecurity Governance",
            "title": "Cybersecurity policy",
            "requirement": "Define, approve and publish a policy",
            "control_type": "Preventive",
            "maturity_level": 2
        })
    };
    let (status, c) = send(&app, "POST", "/api/catalog/controls", None, Some(control("1-1-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    send(&app, "POST", "/api/catalog/controls", None, Some(control("1-1-2"))).await;
    let (status, _) = send(&app, "POST", "/api/catalog/controls", None, Some(control("1-1-1"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, fw) = send(&app, "GET", "/api/catalog/frameworks/ECC", None, None).await;
    assert_eq!(fw["control_count"], 2);

    let (_, found) = send(&app, "GET", "/api/catalog/controls/search?q=POLICY", None, None).await;
    assert_eq!(found.as_array().unwrap().len(), 2);
    let (_, found) = send(&app, "GET", "/api/catalog/controls/search?q=%25", None, None).await;
    assert!(found.as_array().unwrap().is_empty());
    let (_, stats) = send(&app, "GET", "/api/catalog/statistics", None, None).await;
    assert_eq!(stats["regulators_total"], 1);
    assert_eq!(stats["controls_active"], 2);

    let tenant = onboard(&app, "Gulf Bank").await;
    let evidence = |control_id: &str| {
        json!({"control_id": control_id, "title": "Policy document", "description": "Signed policy", "evidence_type": "Document"})
    };
    let (status, body) = send(&app, "POST", "/api/evidence", tenant, Some(evidence(&Uuid::new_v4().to_string()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");

    let control_id = c["id"].as_str().unwrap();
    let (status, _) = send(&app, "POST", "/api/evidence", tenant, Some(evidence(control_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, compliance) = send(&app, "GET", &format!("/api/evidence/compliance/{control_id}"), tenant, None).await;
    assert_eq!(compliance["status"], "InProgress");
}

#[tokio::test]
async fn risk_lifecycle_over_http() {
    let app = app();
    let tenant = onboard(&app, "Gulf Bank").await;

    let (status, risk) = send(&app, "POST", "/api/risks", tenant, Some(risk_body(4, 5))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(risk["status"], "Identified");
    assert_eq!(risk["inherent_score"], 20);
    assert_eq!(risk["level"], "Critical");
    assert_eq!(risk["created_by"], "auditor");
    let id = risk["id"].as_str().unwrap().to_string();

    // closing straight from Identified is illegal
    let (status, body) = send(&app, "POST", &format!("/api/risks/{id}/close"), tenant, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_STATE");

    for step in ["assess", "submit-decision", "reject-acceptance"] {
        let (status, _) = send(&app, "POST", &format!("/api/risks/{id}/{step}"), tenant, None).await;
        assert_eq!(status, StatusCode::OK, "{step}");
    }
    let (status, _) = send(&app, "POST", &format!("/api/risks/{id}/mitigate"), tenant, Some(json!({"details": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, risk) =
        send(&app, "POST", &format!("/api/risks/{id}/mitigate"), tenant, Some(json!({"details": "failover tested"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(risk["status"], "Mitigated");

    let (_, list) = send(&app, "GET", "/api/risks?status=mitigated", tenant, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (status, body) = send(&app, "GET", "/api/risks?level=Severe", tenant, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_FAILED");

    let (_, stats) = send(&app, "GET", "/api/risks/statistics", tenant, None).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["mitigated"], 1);
    let (_, cells) = send(&app, "GET", "/api/risks/heatmap", tenant, None).await;
    assert_eq!(cells.as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn risks_are_isolated_per_tenant() {
    let app = app();
    let (a, b) = (onboard(&app, "Bank A").await, onboard(&app, "Bank B").await);
    let (_, risk) = send(&app, "POST", "/api/risks", a, Some(risk_body(2, 2))).await;
    let id = risk["id"].as_str().unwrap();
    let (status, body) = send(&app, "GET", &format!("/api/risks/{id}"), b, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");
    let (status, _) = send(&app, "DELETE", &format!("/api/risks/{id}"), a, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn appetite_conflicts_and_comparison() {
    let app = app();
    let tenant = onboard(&app, "Gulf Bank").await;
    let setting = json!({
        "category": "Operational",
        "name": "Ops appetite",
        "minimum_risk_score": 10,
        "maximum_risk_score": 60,
        "target_risk_score": 40,
        "tolerance_percentage": 10,
        "impact_threshold": 3,
        "likelihood_threshold": 3
    });
    let (status, created) = send(&app, "POST", "/api/risk-appetite", tenant, Some(setting.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_active"], true);

    let (status, body) = send(&app, "POST", "/api/risk-appetite", tenant, Some(setting)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "CONFLICT");

    send(&app, "POST", "/api/risks", tenant, Some(risk_body(5, 5))).await;
    let (status, rows) = send(&app, "GET", "/api/risk-appetite/compare", tenant, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows[0]["status"], "Exceeded");
    assert_eq!(rows[0]["requires_action"], true);

    let (status, summary) = send(&app, "GET", "/api/risk-appetite/summary", tenant, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_risks"], 1);
}

#[tokio::test]
async fn evidence_review_and_scoring() {
    let app = app();
    let tenant = onboard(&app, "Gulf Bank").await;
    let (status, ev) = send(
        &app,
        "POST",
        "/api/evidence",
        tenant,
        Some(json!({"title": "Access review Q3", "description": "Quarterly access review export", "evidence_type": "Document"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ev["status"], "Draft");
    assert!(ev["evidence_number"].as_str().unwrap().starts_with("EV-"));
    let id = ev["id"].as_str().unwrap().to_string();

    send(&app, "POST", &format!("/api/evidence/{id}/submit-for-review"), tenant, None).await;
    let (_, ev) = send(&app, "POST", &format!("/api/evidence/{id}/start-review"), tenant, None).await;
    assert_eq!(ev["reviewer"], "auditor");

    let (status, _) = send(&app, "POST", &format!("/api/evidence/{id}/score"), tenant, Some(json!({"score": 101}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, out) = send(&app, "POST", &format!("/api/evidence/{id}/score"), tenant, Some(json!({"score": 55}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["evidence"]["status"], "ChangesRequested");

    let (status, ev) = send(&app, "POST", &format!("/api/evidence/{id}/resubmit"), tenant, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ev["status"], "InReview");

    let (_, out) = send(&app, "POST", &format!("/api/evidence/{id}/score"), tenant, Some(json!({"score": 92}))).await;
    assert_eq!(out["evidence"]["status"], "Approved");

    let (_, history) = send(&app, "GET", &format!("/api/evidence/{id}/scores"), tenant, None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["score"], 92);
    assert_eq!(history[0]["is_final"], true);
    assert_eq!(history[1]["is_final"], false);

    let (status, body) = send(&app, "POST", &format!("/api/evidence/{id}/reject"), tenant, Some(json!({"reason": "late"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_STATE");

    let (_, stats) = send(&app, "GET", "/api/evidence/statistics", tenant, None).await;
    assert_eq!(stats["total"], 1);
}

#[tokio::test]
async fn workflow_runs_through_its_tasks() {
    let app = app();
    let tenant = onboard(&app, "Gulf Bank").await;
    let (status, wf) = send(
        &app,
        "POST",
        "/api/workflows",
        tenant,
        Some(json!({
            "definition_key": "risk-acceptance",
            "entity_type": "risk",
            "tasks": [{"name": "Owner review", "assignee": "alice"}, {"name": "CRO sign-off", "assignee": "bob"}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(wf["status"], "Pending");
    let id = wf["id"].as_str().unwrap().to_string();
    let first = wf["tasks"][0]["id"].as_str().unwrap().to_string();
    let second = wf["tasks"][1]["id"].as_str().unwrap().to_string();

    // decisions need a running workflow
    let (status, body) = send(&app, "POST", &format!("/api/workflows/{id}/tasks/{first}/approve"), tenant, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_STATE");

    let (_, wf) = send(&app, "POST", &format!("/api/workflows/{id}/start"), tenant, None).await;
    assert_eq!(wf["status"], "InProgress");
    assert_eq!(wf["tasks"][0]["status"], "InProgress");

    let (_, inbox) = send(&app, "GET", "/api/workflows/tasks?assignee=alice", tenant, None).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    let (status, _) = send(&app, "GET", "/api/workflows/tasks", tenant, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, wf) = send(&app, "POST", &format!("/api/workflows/{id}/tasks/{first}/approve"), tenant, Some(json!({"comments": "ok"}))).await;
    assert_eq!(wf["status"], "InApproval");
    assert_eq!(wf["tasks"][1]["status"], "InProgress");

    let (_, wf) = send(&app, "POST", &format!("/api/workflows/{id}/tasks/{second}/reject"), tenant, Some(json!({"reason": "needs budget"}))).await;
    assert_eq!(wf["status"], "Rejected");

    let (_, wf) = send(&app, "POST", &format!("/api/workflows/{id}/retry"), tenant, None).await;
    assert_eq!(wf["status"], "InProgress");
    let (_, wf) = send(&app, "POST", &format!("/api/workflows/{id}/tasks/{second}/approve"), tenant, None).await;
    assert_eq!(wf["status"], "Completed");
    assert!(wf["completed_at"].is_string());

    let (status, _) = send(&app, "POST", &format!("/api/workflows/{id}/cancel"), tenant, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn diagnostics_capture_and_lookup() {
    let app = app();
    let (status, _) = send(&app, "POST", "/api/diagnostics/visitors", None, Some(json!({"action": "click"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, rec) = send(&app, "POST", "/api/diagnostics/visitors", None, Some(json!({"page": "/dashboard"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rec["success"], true);

    let (_, rec) = send(&app, "POST", "/api/diagnostics/errors", None, Some(json!({"page": "/risks", "message": "TypeError: x is undefined"}))).await;
    let err_id = rec["id"].as_str().unwrap().to_string();
    let (status, err) = send(&app, "GET", &format!("/api/diagnostics/errors/{err_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(err["error_type"], "UnknownError");

    let (status, _) = send(&app, "GET", &format!("/api/diagnostics/errors/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, analytics) = send(&app, "GET", "/api/diagnostics/analytics", None, None).await;
    assert_eq!(analytics["period_hours"], 24);
    assert_eq!(analytics["visitors"]["total"], 1);
    assert_eq!(analytics["errors"]["total"], 1);

    let (_, health) = send(&app, "GET", "/api/diagnostics/health", None, None).await;
    assert_eq!(health["error_count"], 1);
}
