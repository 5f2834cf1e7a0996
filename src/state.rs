//! Shared application state, built once at startup and cloned into every handler.

use std::sync::Arc;

use anyhow::Context;

use crate::auth::KeyStore;
use crate::config::AppConfig;
use crate::database::{DocumentStore, SqliteDocumentStore};
use crate::services::{BlobStore, GeocodeClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<KeyStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: BlobStore,
    pub geocoder: GeocodeClient,
}

impl AppState {
    /// Assemble state around an already-opened document store and uploads directory.
    pub fn new(
        config: AppConfig,
        documents: Arc<dyn DocumentStore>,
        blobs: BlobStore,
    ) -> anyhow::Result<Self> {
        let keys = KeyStore::from_config(&config.security);
        let geocoder = GeocodeClient::new(&config.geocode).context("failed to build geocoding client")?;

        Ok(Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
            documents,
            blobs,
            geocoder,
        })
    }

    /// Open the SQLite store and uploads directory named by `config`.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let documents = SqliteDocumentStore::connect(&config.storage)
            .await
            .with_context(|| {
                format!(
                    "failed to open document store at {}",
                    config.storage.database_path.display()
                )
            })?;

        let blobs = BlobStore::open(config.storage.uploads_dir.clone())
            .await
            .context("failed to prepare uploads directory")?;

        Self::new(config, Arc::new(documents), blobs)
    }
}
