use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::{optional_text, parse_json_or_default};
use crate::auth::issue_tenant_key;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IssueKeyRequest {
    pub tenant_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssueKeyResponse {
    pub tenant_id: String,
    pub api_key: String,
}

/// POST /api/admin/tenant-keys - mint a new API key for a tenant
///
/// The body is read leniently: anything that is not a JSON object with a
/// non-blank string `tenant_id` is a 400. Re-issuing replaces the tenant's
/// previous key immediately.
pub async fn issue_key(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<IssueKeyResponse>)> {
    let request: IssueKeyRequest = parse_json_or_default(&String::from_utf8_lossy(&body), "tenant key request");
    let tenant_id = optional_text(request.tenant_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("tenant_id required"))?;

    let api_key = issue_tenant_key(&state.keys, &tenant_id).await?;

    Ok((StatusCode::CREATED, Json(IssueKeyResponse { tenant_id, api_key })))
}
