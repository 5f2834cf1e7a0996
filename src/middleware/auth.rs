use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::auth::secrets_match;
use crate::error::ApiError;
use crate::state::AppState;
use crate::tenant::tenant_from_request;

/// Routes under this prefix are gated by tenant API keys.
pub const LIBRARY_API_PREFIX: &str = "/api/library";
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Default, Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

/// Tenant key middleware for the library API.
///
/// Resolves the request's tenant, asks the key store which key that tenant
/// requires, and rejects the request unless exactly that key is presented via
/// `X-API-Key` or `?api_key=`. Tenants without a required key pass through.
pub async fn tenant_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !request.uri().path().starts_with(LIBRARY_API_PREFIX) {
        return Ok(next.run(request).await);
    }

    let tenant = tenant_from_request(request.headers(), request.uri());
    let Some(required) = state.keys.resolve_required_key(tenant.as_str()).await else {
        return Ok(next.run(request).await);
    };

    let provided = extract_api_key(request.headers(), request.uri());
    if !secrets_match(&provided, &required) {
        tracing::warn!(
            tenant = %tenant,
            path = %request.uri().path(),
            presented = !provided.is_empty(),
            "rejected library request: tenant key mismatch"
        );
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    Ok(next.run(request).await)
}

/// Presented key from `X-API-Key`, falling back to `?api_key=`; empty when absent.
fn extract_api_key(headers: &HeaderMap, uri: &Uri) -> String {
    let header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let provided = match header {
        Some(value) => value.to_string(),
        None => Query::<ApiKeyQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(q)| q.api_key)
            .unwrap_or_default(),
    };

    provided.trim().to_string()
}
