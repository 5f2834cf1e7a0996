//! Tenant resolution shared by the key gate and the library handlers.
//!
//! Both the auth decision and document scoping must see the same tenant, so
//! every caller goes through [`resolve_tenant`].

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, HeaderMap, Uri},
};
use serde::Deserialize;
use std::convert::Infallible;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const TENANT_QUERY_PARAM: &str = "tenant";
pub const DEFAULT_TENANT: &str = "default";

#[derive(Debug, Default, Deserialize)]
struct TenantQuery {
    tenant: Option<String>,
}

/// Tenant a request is scoped to. Any non-empty string is a valid tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant(pub String);

impl Tenant {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pick the tenant from the `X-Tenant-ID` header, falling back to `?tenant=`.
///
/// A non-empty header wins even when it trims down to nothing; blank results
/// resolve to `"default"`.
pub fn resolve_tenant(header: Option<&str>, query: Option<&str>) -> Tenant {
    let raw = header
        .filter(|h| !h.is_empty())
        .or_else(|| query.filter(|q| !q.is_empty()))
        .unwrap_or_default()
        .trim();

    if raw.is_empty() {
        Tenant(DEFAULT_TENANT.to_string())
    } else {
        Tenant(raw.to_string())
    }
}

/// Resolve the tenant straight from request headers and URI.
pub fn tenant_from_request(headers: &HeaderMap, uri: &Uri) -> Tenant {
    let header = headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok());
    let query = Query::<TenantQuery>::try_from_uri(uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    resolve_tenant(header, query.tenant.as_deref())
}

#[async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(tenant_from_request(&parts.headers, &parts.uri))
    }
}
