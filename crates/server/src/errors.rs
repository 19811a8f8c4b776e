use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use service::errors::ServiceError;

use crate::observability;

const INTERNAL_MESSAGE: &str = "An internal error occurred. Quote the correlation id when reporting it.";

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error_code: &'a str,
    message: &'a str,
    correlation_id: Uuid,
}

/// JSON error response with a stable machine-readable code.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
    }

    pub fn tenant_required(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "TENANT_REQUIRED", message)
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let status = match e.code() {
            "VALIDATION_FAILED" | "INVALID_STATE" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // internal detail goes to the log in into_response, never to the client
        Self { status, code: e.code(), message: e.to_string() }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4();
        observability::API_ERRORS.with_label_values(&[self.code]).inc();
        let message = if self.status.is_server_error() {
            error!(%correlation_id, code = self.code, error = %self.message, "request failed");
            INTERNAL_MESSAGE
        } else {
            warn!(%correlation_id, code = self.code, status = self.status.as_u16(), message = %self.message, "request rejected");
            self.message.as_str()
        };
        let body = ErrorBody { success: false, error_code: self.code, message, correlation_id };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
