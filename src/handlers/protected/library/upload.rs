use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::{optional_text, parse_json_or_default, parse_lenient};
use crate::database::{DocumentType, NewDocument};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::tenant::Tenant;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: i64,
    pub url: String,
}

/// Multipart fields as received, before validation.
#[derive(Debug, Default)]
struct UploadForm {
    document_type: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    altitude_m: Option<String>,
    url: Option<String>,
    type_metadata: Option<String>,
    file: Option<(String, Bytes)>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "file" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid file upload: {}", e)))?;
                // A file part without a filename means no file was chosen.
                if !filename.is_empty() {
                    form.file = Some((filename, content));
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid form field '{}': {}", name, e)))?;

            match name.as_str() {
                "document_type" => form.document_type = Some(value),
                "lat" => form.lat = Some(value),
                "lon" => form.lon = Some(value),
                "altitude_m" => form.altitude_m = Some(value),
                "url" => form.url = Some(value),
                "type_metadata" => form.type_metadata = Some(value),
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Where clients fetch the new document: the external URL when one was
/// given, else the download route.
pub fn access_url(url: Option<&str>, id: i64) -> String {
    match url {
        Some(url) => url.to_string(),
        None => format!("/api/library/documents/{}/download", id),
    }
}

/// Any JSON value is stored as given; blank, `null` or malformed text becomes `{}`.
pub fn parse_type_metadata(raw: Option<&str>) -> Value {
    let parsed = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_json_or_default::<Option<Value>>(raw, "type_metadata"),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::Object(Map::new()))
}

/// POST /api/library/upload - store an optional blob and create its record
pub async fn upload(
    State(state): State<AppState>,
    tenant: Tenant,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let form = UploadForm::read(multipart).await?;

    // Validated before anything touches the uploads directory.
    let document_type: DocumentType = form
        .document_type
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid document_type"))?;

    let url = optional_text(form.url.as_deref());
    let type_metadata = parse_type_metadata(form.type_metadata.as_deref());

    let blob_ref = match &form.file {
        Some((filename, content)) => Some(state.blobs.save(filename, content).await?),
        None => None,
    };

    let id = state
        .documents
        .insert(NewDocument {
            tenant_id: tenant.0.clone(),
            document_type,
            blob_ref: blob_ref.clone(),
            url: url.clone(),
            type_metadata,
            owner_id: None,
            lat: parse_lenient(form.lat.as_deref()),
            lon: parse_lenient(form.lon.as_deref()),
            altitude_m: parse_lenient(form.altitude_m.as_deref()),
        })
        .await?;

    tracing::info!(
        tenant = %tenant,
        id,
        document_type = %document_type,
        blob_ref = ?blob_ref,
        "created library document"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id,
            url: access_url(url.as_deref(), id),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_url_wins() {
        assert_eq!(access_url(Some("https://cdn.test/a.mp4"), 7), "https://cdn.test/a.mp4");
    }

    #[test]
    fn type_metadata_keeps_any_json_value() {
        assert_eq!(parse_type_metadata(Some(r#"{"title": "x"}"#)), serde_json::json!({"title": "x"}));
        assert_eq!(parse_type_metadata(Some("[1,2]")), serde_json::json!([1, 2]));
        assert_eq!(parse_type_metadata(Some("42")), serde_json::json!(42));
    }

    #[test]
    fn type_metadata_falls_back_to_empty_object() {
        assert_eq!(parse_type_metadata(None), serde_json::json!({}));
        assert_eq!(parse_type_metadata(Some("   ")), serde_json::json!({}));
        assert_eq!(parse_type_metadata(Some("{oops")), serde_json::json!({}));
        assert_eq!(parse_type_metadata(Some("null")), serde_json::json!({}));
    }

    #[test]
    fn download_route_otherwise() {
        assert_eq!(access_url(None, 7), "/api/library/documents/7/download");
    }
}
