use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use service::diagnostics::{Analytics, DiagnosticsHealth, ErrorEvent, ErrorInput, VisitorInput};

use crate::errors::JsonApiError;
use crate::state::AppState;

const DEFAULT_HOURS: i64 = 24;
const MAX_HOURS: i64 = 24 * 30;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HoursQuery {
    /// Look-back window, default 24
    pub hours: Option<i64>,
}

impl HoursQuery {
    fn window(&self) -> Result<i64, JsonApiError> {
        match self.hours {
            None => Ok(DEFAULT_HOURS),
            Some(h) if (1..=MAX_HOURS).contains(&h) => Ok(h),
            Some(_) => Err(JsonApiError::validation(format!("hours must be between 1 and {MAX_HOURS}"))),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Recorded {
    pub success: bool,
    pub id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/diagnostics/visitors", post(record_visitor))
        .route("/api/diagnostics/errors", post(record_error))
        .route("/api/diagnostics/errors/:id", get(get_error))
        .route("/api/diagnostics/analytics", get(analytics))
        .route("/api/diagnostics/export", get(export))
        .route("/api/diagnostics/health", get(health))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[utoipa::path(
    post, path = "/api/diagnostics/visitors", tag = "diagnostics",
    request_body = crate::openapi::VisitorInputDoc,
    responses((status = 200, description = "Recorded", body = Recorded), (status = 400, description = "Missing page"))
)]
pub async fn record_visitor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut input): Json<VisitorInput>,
) -> Result<Json<Recorded>, JsonApiError> {
    if input.page.trim().is_empty() {
        return Err(JsonApiError::validation("page is required"));
    }
    input.user_agent = input.user_agent.or_else(|| user_agent(&headers));
    input.ip_address = input.ip_address.or_else(|| client_ip(&headers));
    let id = state.diagnostics.record_visitor(input);
    Ok(Json(Recorded { success: true, id }))
}

#[utoipa::path(
    post, path = "/api/diagnostics/errors", tag = "diagnostics",
    request_body = crate::openapi::ErrorInputDoc,
    responses((status = 200, description = "Recorded", body = Recorded), (status = 400, description = "Missing page or message"))
)]
pub async fn record_error(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut input): Json<ErrorInput>,
) -> Result<Json<Recorded>, JsonApiError> {
    if input.page.trim().is_empty() || input.message.trim().is_empty() {
        return Err(JsonApiError::validation("page and message are required"));
    }
    input.user_agent = input.user_agent.or_else(|| user_agent(&headers));
    input.ip_address = input.ip_address.or_else(|| client_ip(&headers));
    let id = state.diagnostics.record_error(input);
    Ok(Json(Recorded { success: true, id }))
}

#[utoipa::path(
    get, path = "/api/diagnostics/errors/{id}", tag = "diagnostics",
    params(("id" = Uuid, Path, description = "Error event id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not in the buffer"))
)]
pub async fn get_error(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ErrorEvent>, JsonApiError> {
    Ok(Json(state.diagnostics.get_error(id)?))
}

#[utoipa::path(
    get, path = "/api/diagnostics/analytics", tag = "diagnostics",
    params(HoursQuery),
    responses((status = 200, description = "OK"), (status = 400, description = "Bad window"))
)]
pub async fn analytics(State(state): State<AppState>, Query(q): Query<HoursQuery>) -> Result<Json<Analytics>, JsonApiError> {
    Ok(Json(state.diagnostics.analytics(q.window()?)))
}

#[utoipa::path(
    get, path = "/api/diagnostics/export", tag = "diagnostics",
    params(HoursQuery),
    responses((status = 200, description = "Errors newest first"), (status = 400, description = "Bad window"))
)]
pub async fn export(State(state): State<AppState>, Query(q): Query<HoursQuery>) -> Result<Json<Vec<ErrorEvent>>, JsonApiError> {
    Ok(Json(state.diagnostics.export_errors(q.window()?)))
}

#[utoipa::path(
    get, path = "/api/diagnostics/health", tag = "diagnostics",
    responses((status = 200, description = "Buffer sizes and time range"))
)]
pub async fn health(State(state): State<AppState>) -> Json<DiagnosticsHealth> {
    Json(state.diagnostics.health())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_window_defaults_and_bounds() {
        assert_eq!(HoursQuery::default().window().unwrap(), 24);
        assert_eq!(HoursQuery { hours: Some(48) }.window().unwrap(), 48);
        assert!(HoursQuery { hours: Some(0) }.window().is_err());
        assert!(HoursQuery { hours: Some(MAX_HOURS + 1) }.window().is_err());
    }

    #[test]
    fn first_forwarded_address_is_the_client() {
        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", "10.0.0.7, 172.16.0.1".parse().unwrap());
        assert_eq!(client_ip(&h).as_deref(), Some("10.0.0.7"));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
