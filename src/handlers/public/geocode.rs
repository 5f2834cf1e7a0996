use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::optional_text;
use crate::error::{ApiError, ApiResult};
use crate::services::Coordinates;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeQuery {
    pub address: Option<String>,
}

/// GET /api/geocode?address= - first coordinates for a free-text address
pub async fn geocode(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> ApiResult<Json<Coordinates>> {
    let address = optional_text(query.address.as_deref())
        .ok_or_else(|| ApiError::bad_request("address query required"))?;

    let coordinates = state.geocoder.lookup(&address).await?;
    Ok(Json(coordinates))
}
