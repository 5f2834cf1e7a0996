use async_trait::async_trait;
use thiserror::Error;

use super::models::{DocumentRecord, NewDocument, SearchParams};

/// Errors from the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Persistence and search for library documents.
///
/// Every read is scoped to a tenant; a record owned by another tenant is
/// indistinguishable from a missing one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<Vec<DocumentRecord>, StoreError>;

    /// Insert a record and return its new id.
    async fn insert(&self, document: NewDocument) -> Result<i64, StoreError>;

    async fn get(&self, id: i64, tenant_id: &str) -> Result<Option<DocumentRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
