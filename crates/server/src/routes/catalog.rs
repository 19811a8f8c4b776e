use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::{control, framework, regulator};
use service::catalog::{CatalogStatistics, ControlFilter, NewControl, NewFramework, NewRegulator, RegionType};

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegulatorQuery {
    /// `saudi`, `regional` or `international`
    pub region_type: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FrameworkQuery {
    pub regulator: Option<String>,
    pub mandatory: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ControlQuery {
    pub framework_code: Option<String>,
    /// Case-insensitive substring
    pub domain: Option<String>,
    pub control_type: Option<String>,
    pub maturity_level: Option<i32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/regulators", get(list_regulators).post(create_regulator))
        .route("/api/catalog/regulators/:code", get(get_regulator))
        .route("/api/catalog/regulators/:code/deactivate", post(deactivate_regulator))
        .route("/api/catalog/frameworks", get(list_frameworks).post(create_framework))
        .route("/api/catalog/frameworks/:code", get(get_framework))
        .route("/api/catalog/controls", get(list_controls).post(create_control))
        .route("/api/catalog/controls/search", get(search_controls))
        .route("/api/catalog/controls/:id", get(get_control))
        .route("/api/catalog/statistics", get(statistics))
}

#[utoipa::path(
    post, path = "/api/catalog/regulators", tag = "catalog",
    request_body = crate::openapi::NewRegulatorDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation failed"), (status = 409, description = "Code exists"))
)]
pub async fn create_regulator(
    State(state): State<AppState>,
    Json(input): Json<NewRegulator>,
) -> Result<(StatusCode, Json<regulator::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.catalog.create_regulator(input).await?)))
}

#[utoipa::path(get, path = "/api/catalog/regulators", tag = "catalog", params(RegulatorQuery), responses((status = 200, description = "OK")))]
pub async fn list_regulators(
    State(state): State<AppState>,
    Query(q): Query<RegulatorQuery>,
) -> Result<Json<Vec<regulator::Model>>, JsonApiError> {
    let region = match q.region_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            RegionType::parse(raw).ok_or_else(|| JsonApiError::validation(format!("unknown region_type '{raw}'")))?,
        ),
        None => None,
    };
    Ok(Json(state.catalog.list_regulators(region).await?))
}

#[utoipa::path(
    get, path = "/api/catalog/regulators/{code}", tag = "catalog",
    params(("code" = String, Path, description = "Regulator code")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_regulator(State(state): State<AppState>, Path(code): Path<String>) -> Result<Json<regulator::Model>, JsonApiError> {
    Ok(Json(state.catalog.get_regulator_by_code(&code).await?))
}

#[utoipa::path(
    post, path = "/api/catalog/regulators/{code}/deactivate", tag = "catalog",
    params(("code" = String, Path, description = "Regulator code")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn deactivate_regulator(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<regulator::Model>, JsonApiError> {
    Ok(Json(state.catalog.deactivate_regulator(&code).await?))
}

#[utoipa::path(
    post, path = "/api/catalog/frameworks", tag = "catalog",
    request_body = crate::openapi::NewFrameworkDoc,
    responses((status = 201, description = "Created"), (status = 404, description = "Unknown regulator"), (status = 409, description = "Code exists"))
)]
pub async fn create_framework(
    State(state): State<AppState>,
    Json(input): Json<NewFramework>,
) -> Result<(StatusCode, Json<framework::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.catalog.create_framework(input).await?)))
}

#[utoipa::path(get, path = "/api/catalog/frameworks", tag = "catalog", params(FrameworkQuery), responses((status = 200, description = "OK")))]
pub async fn list_frameworks(
    State(state): State<AppState>,
    Query(q): Query<FrameworkQuery>,
) -> Result<Json<Vec<framework::Model>>, JsonApiError> {
    Ok(Json(state.catalog.list_frameworks(q.regulator.as_deref(), q.mandatory).await?))
}

#[utoipa::path(
    get, path = "/api/catalog/frameworks/{code}", tag = "catalog",
    params(("code" = String, Path, description = "Framework code")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_framework(State(state): State<AppState>, Path(code): Path<String>) -> Result<Json<framework::Model>, JsonApiError> {
    Ok(Json(state.catalog.get_framework_by_code(&code).await?))
}

#[utoipa::path(
    post, path = "/api/catalog/controls", tag = "catalog",
    request_body = crate::openapi::NewControlDoc,
    responses((status = 201, description = "Created"), (status = 404, description = "Unknown framework"), (status = 409, description = "Number exists in framework"))
)]
pub async fn create_control(
    State(state): State<AppState>,
    Json(input): Json<NewControl>,
) -> Result<(StatusCode, Json<control::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.catalog.create_control(input).await?)))
}

#[utoipa::path(get, path = "/api/catalog/controls", tag = "catalog", params(ControlQuery), responses((status = 200, description = "OK")))]
pub async fn list_controls(
    State(state): State<AppState>,
    Query(q): Query<ControlQuery>,
) -> Result<Json<Page<control::Model>>, JsonApiError> {
    let filter = ControlFilter {
        framework_code: q.framework_code,
        domain: q.domain,
        control_type: q.control_type,
        maturity_level: q.maturity_level,
    };
    let defaults = Pagination::default();
    let page = Pagination { page: q.page.unwrap_or(defaults.page), per_page: q.per_page.unwrap_or(defaults.per_page) };
    Ok(Json(state.catalog.list_controls(&filter, page).await?))
}

#[utoipa::path(
    get, path = "/api/catalog/controls/search", tag = "catalog", params(SearchQuery),
    responses((status = 200, description = "OK"), (status = 400, description = "Missing query"))
)]
pub async fn search_controls(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<control::Model>>, JsonApiError> {
    Ok(Json(state.catalog.search_controls(&q.q, q.limit.unwrap_or(20)).await?))
}

#[utoipa::path(
    get, path = "/api/catalog/controls/{id}", tag = "catalog",
    params(("id" = Uuid, Path, description = "Control id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not found"))
)]
pub async fn get_control(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<control::Model>, JsonApiError> {
    Ok(Json(state.catalog.get_control(id).await?))
}

#[utoipa::path(get, path = "/api/catalog/statistics", tag = "catalog", responses((status = 200, description = "OK")))]
pub async fn statistics(State(state): State<AppState>) -> Result<Json<CatalogStatistics>, JsonApiError> {
    Ok(Json(state.catalog.statistics().await?))
}
