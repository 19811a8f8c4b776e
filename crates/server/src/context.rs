use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user";
const DEFAULT_USER: &str = "system";

/// Acting user from `X-User`, recorded in audit fields.
pub fn acting_user(headers: &HeaderMap) -> String {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USER)
        .to_string()
}

/// Tenant and user a tenant-scoped request acts for. The tenant must exist.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user: String,
}

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| JsonApiError::tenant_required("X-Tenant-Id header is required"))?;
        let tenant_id = Uuid::parse_str(raw)
            .map_err(|_| JsonApiError::tenant_required("X-Tenant-Id must be a UUID"))?;
        state.tenants.get(tenant_id).await?;
        Ok(Self { tenant_id, user: acting_user(&parts.headers) })
    }
}

/// Acting user only, for routes that are not tenant-scoped.
#[derive(Clone, Debug)]
pub struct Actor(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Actor(acting_user(&parts.headers)))
    }
}
