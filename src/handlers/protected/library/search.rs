use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::{optional_text, parse_lenient};
use crate::database::{DocumentRecord, DocumentType, SearchParams};
use crate::error::ApiResult;
use crate::state::AppState;
use crate::tenant::Tenant;

pub const DEFAULT_SEARCH_LIMIT: i64 = 100;
pub const MAX_SEARCH_LIMIT: i64 = 500;

/// Raw query string; every value is parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub document_type: Option<String>,
    pub q: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub distance_mi: Option<String>,
    pub limit: Option<String>,
}

/// Requested limit, defaulting to 100 and clamped into `0..=500`.
pub fn clamp_limit(raw: Option<&str>) -> i64 {
    parse_lenient::<i64>(raw)
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(0, MAX_SEARCH_LIMIT)
}

/// GET /api/library/search - tenant-scoped document search
pub async fn search(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<DocumentRecord>>> {
    let document_type = match optional_text(query.document_type.as_deref()) {
        None => None,
        Some(raw) => match raw.parse::<DocumentType>() {
            Ok(t) => Some(t),
            Err(_) => {
                // No record can carry an unknown type.
                tracing::debug!(document_type = %raw, "search for unknown document type");
                return Ok(Json(Vec::new()));
            }
        },
    };

    let params = SearchParams {
        tenant_id: tenant.0,
        document_type,
        q: optional_text(query.q.as_deref()),
        lat: parse_lenient(query.lat.as_deref()),
        lon: parse_lenient(query.lon.as_deref()),
        distance_mi: parse_lenient(query.distance_mi.as_deref()),
        limit: clamp_limit(query.limit.as_deref()),
    };

    let records = state.documents.search(&params).await?;
    Ok(Json(records))
}
