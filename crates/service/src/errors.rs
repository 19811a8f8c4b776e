use thiserror::Error;

use models::errors::ModelError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("cannot move {entity} from '{from}' to '{to}'; allowed: [{}]", allowed.join(", "))]
    InvalidTransition { entity: &'static str, from: String, to: String, allowed: Vec<String> },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Stable machine-readable code carried in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) | ServiceError::Model(ModelError::Validation(_)) => "VALIDATION_FAILED",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::InvalidTransition { .. } | ServiceError::InvalidState(_) => "INVALID_STATE",
            ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_)) => "GRC_ERROR",
        }
    }

    /// Failures whose detail must stay in the logs.
    pub fn is_internal(&self) -> bool { self.code() == "GRC_ERROR" }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { ServiceError::Db(e.to_string()) }
}
