use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::secrets_match;
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// How the admin endpoints are protected, derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAccess {
    /// Callers must present this secret.
    Secret(String),
    /// No secret configured and the operator opted in to an open endpoint.
    Open,
    /// No secret configured and no opt-in: every call is refused.
    Disabled,
}

impl AdminAccess {
    pub fn from_config(security: &SecurityConfig) -> Self {
        match &security.admin_key {
            Some(secret) if !secret.is_empty() => AdminAccess::Secret(secret.clone()),
            _ if security.admin_open => AdminAccess::Open,
            _ => AdminAccess::Disabled,
        }
    }
}

/// Gate for `/api/admin/*`, independent of tenant keys.
pub async fn admin_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match AdminAccess::from_config(&state.config.security) {
        AdminAccess::Open => {}
        AdminAccess::Disabled => {
            tracing::warn!("rejected admin request: no admin key configured");
            return Err(ApiError::forbidden("Forbidden"));
        }
        AdminAccess::Secret(expected) => {
            let provided = extract_admin_secret(request.headers());
            if !secrets_match(&provided, &expected) {
                tracing::warn!(path = %request.uri().path(), "rejected admin request: bad admin key");
                return Err(ApiError::forbidden("Forbidden"));
            }
        }
    }

    Ok(next.run(request).await)
}

/// Admin secret from `X-Admin-Key`, else `Authorization`; a `Bearer ` prefix
/// is stripped from whichever was used.
fn extract_admin_secret(headers: &HeaderMap) -> String {
    let raw = [ADMIN_KEY_HEADER, "authorization"]
        .into_iter()
        .filter_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
        .find(|v| !v.is_empty())
        .unwrap_or_default();

    match raw.strip_prefix("Bearer ") {
        Some(token) => token.trim().to_string(),
        None => raw.to_string(),
    }
}
