use axum::{routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::observability;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod appetite;
pub mod catalog;
pub mod diagnostics;
pub mod evidence;
pub mod risks;
pub mod tenants;
pub mod workflows;

#[utoipa::path(get, path = "/health", tag = "platform", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: platform endpoints, every API module and the docs UI.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let platform = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(observability::metrics));

    let api = Router::new()
        .merge(tenants::router())
        .merge(catalog::router())
        .merge(risks::router())
        .merge(appetite::router())
        .merge(evidence::router())
        .merge(workflows::router())
        .merge(diagnostics::router())
        .with_state(state);

    platform
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status code and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx and friends at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
