use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use super::document_get::{load_document, parse_document_id};
use crate::database::DocumentRecord;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::tenant::Tenant;

/// What a download request for a record should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// External location and no local copy.
    Redirect(String),
    /// Locally stored blob.
    Blob(String),
    /// Neither a blob nor a URL was recorded.
    NoFile,
}

impl DownloadTarget {
    /// An external URL only wins when there is no blob reference.
    pub fn for_record(record: &DocumentRecord) -> Self {
        let url = record.url.as_deref().filter(|u| !u.is_empty());
        let blob_ref = record.blob_ref.as_deref().filter(|b| !b.is_empty());

        match (url, blob_ref) {
            (Some(url), None) => DownloadTarget::Redirect(url.to_string()),
            (_, Some(blob_ref)) => DownloadTarget::Blob(blob_ref.to_string()),
            (None, None) => DownloadTarget::NoFile,
        }
    }
}

/// GET /api/library/documents/:id/download - redirect, stream the blob, or 404
pub async fn download(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_document_id(&id)?;
    let record = load_document(&state, &tenant, id).await?;

    let blob_ref = match DownloadTarget::for_record(&record) {
        DownloadTarget::Redirect(url) => return redirect_found(&url),
        DownloadTarget::NoFile => return Err(ApiError::not_found("No file")),
        DownloadTarget::Blob(blob_ref) => blob_ref,
    };

    let path = state.blobs.resolve(&blob_ref).await?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("File not found"))?;
    let length = file.metadata().await.ok().map(|m| m.len());

    tracing::debug!(tenant = %tenant, id, blob_ref = %blob_ref, "streaming library blob");

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let disposition = format!("attachment; filename=\"{}\"", blob_ref);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::internal_server_error(e.to_string()))?,
    );
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

fn redirect_found(url: &str) -> ApiResult<Response> {
    let location = HeaderValue::from_str(url)
        .map_err(|_| ApiError::internal_server_error(format!("Stored URL is not a valid location: {}", url)))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DocumentType;
    use chrono::Utc;
    use serde_json::json;

    fn record(url: Option<&str>, blob_ref: Option<&str>) -> DocumentRecord {
        DocumentRecord {
            id: 1,
            tenant_id: "acme".to_string(),
            document_type: DocumentType::Document,
            blob_ref: blob_ref.map(str::to_string),
            url: url.map(str::to_string),
            type_metadata: json!({}),
            owner_id: None,
            lat: None,
            lon: None,
            altitude_m: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn url_without_blob_redirects() {
        assert_eq!(
            DownloadTarget::for_record(&record(Some("https://cdn.test/a.pdf"), None)),
            DownloadTarget::Redirect("https://cdn.test/a.pdf".to_string())
        );
    }

    #[test]
    fn blob_wins_over_url() {
        assert_eq!(
            DownloadTarget::for_record(&record(Some("https://cdn.test/a.pdf"), Some("abc.pdf"))),
            DownloadTarget::Blob("abc.pdf".to_string())
        );
        assert_eq!(
            DownloadTarget::for_record(&record(None, Some("abc.pdf"))),
            DownloadTarget::Blob("abc.pdf".to_string())
        );
    }

    #[test]
    fn neither_is_no_file() {
        assert_eq!(DownloadTarget::for_record(&record(None, None)), DownloadTarget::NoFile);
        assert_eq!(DownloadTarget::for_record(&record(Some(""), Some(""))), DownloadTarget::NoFile);
    }
}
