use axum::{
    extract::{Path, State},
    Json,
};

use crate::database::DocumentRecord;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::tenant::Tenant;

/// Document ids are integers; anything else cannot name a document.
pub(super) fn parse_document_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|_| ApiError::not_found("Not found"))
}

/// Fetch `id` for `tenant`, treating another tenant's record as missing.
pub(super) async fn load_document(state: &AppState, tenant: &Tenant, id: i64) -> ApiResult<DocumentRecord> {
    state
        .documents
        .get(id, tenant.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))
}

/// GET /api/library/documents/:id - show one tenant-scoped record
pub async fn document_get(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Json<DocumentRecord>> {
    let id = parse_document_id(&id)?;
    let record = load_document(&state, &tenant, id).await?;
    Ok(Json(record))
}
