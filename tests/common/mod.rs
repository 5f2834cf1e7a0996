#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tempfile::TempDir;

use continuum_library::config::AppConfig;
use continuum_library::database::SqliteDocumentStore;
use continuum_library::services::BlobStore;
use continuum_library::{app, AppState};

/// A library server running in-process on an unused port, backed by an
/// in-memory SQLite store and a scratch directory for uploads and keys.
pub struct TestServer {
    pub base_url: String,
    pub dir: TempDir,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn keys_file(&self) -> PathBuf {
        self.dir.path().join("state").join("tenant_keys.json")
    }

    /// Files currently in the uploads directory.
    pub fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.uploads_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Base configuration pointing every path into `dir` and geocoding at a
/// fake upstream.
pub fn test_config(dir: &TempDir, geocode_url: &str) -> AppConfig {
    let mut config = AppConfig::development();
    config.server.ui_dir = dir.path().join("ui");
    config.storage.uploads_dir = dir.path().join("uploads");
    config.storage.database_path = dir.path().join("continuum.db");
    config.security.tenant_keys_file = Some(dir.path().join("state").join("tenant_keys.json"));
    config.geocode.endpoint = geocode_url.to_string();
    config.geocode.timeout_secs = 2;
    config.geocode.retries = 0;
    config
}

/// Start a server; `configure` adjusts the config before state is built.
pub async fn spawn_server<F>(configure: F) -> Result<TestServer>
where
    F: FnOnce(&mut AppConfig),
{
    init_tracing();

    let dir = tempfile::tempdir().context("failed to create temp dir")?;
    let geocode_addr = spawn_fake_geocoder().await?;
    let mut config = test_config(&dir, &format!("http://{}/search", geocode_addr));
    configure(&mut config);

    let documents = SqliteDocumentStore::in_memory().await?;
    let blobs = BlobStore::open(config.storage.uploads_dir.clone()).await?;
    let state = AppState::new(config, Arc::new(documents), blobs)?;

    let addr = serve(app(state.clone())).await?;

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        dir,
        state,
    })
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build test client")
}

async fn serve(router: Router) -> Result<SocketAddr> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(addr)
}

#[derive(Deserialize)]
struct FakeSearch {
    q: String,
}

/// Nominatim stand-in: "nowhere" has no match, "explode" fails upstream,
/// anything else resolves to central London.
async fn spawn_fake_geocoder() -> Result<SocketAddr> {
    async fn search(Query(params): Query<FakeSearch>) -> (StatusCode, Json<Value>) {
        match params.q.as_str() {
            "nowhere" => (StatusCode::OK, Json(json!([]))),
            "explode" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))),
            _ => (
                StatusCode::OK,
                Json(json!([{"lat": "51.5074", "lon": "-0.1278", "display_name": params.q}])),
            ),
        }
    }

    serve(Router::new().route("/search", get(search))).await
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
