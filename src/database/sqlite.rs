use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::time::Duration;
use tracing::info;

use super::models::{haversine_miles, DocumentRecord, NewDocument, SearchParams};
use super::store::{DocumentStore, StoreError};
use crate::config::StorageConfig;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS library_documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id TEXT NOT NULL,
        document_type TEXT NOT NULL,
        blob_ref TEXT,
        url TEXT,
        type_metadata TEXT NOT NULL DEFAULT '{}',
        owner_id TEXT,
        lat REAL,
        lon REAL,
        altitude_m REAL,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_TENANT_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_library_documents_tenant
    ON library_documents (tenant_id, document_type)
"#;

const SELECT_COLUMNS: &str = "SELECT id, tenant_id, document_type, blob_ref, url, type_metadata, \
     owner_id, lat, lon, altitude_m, created_at FROM library_documents";

/// SQLite-backed document store
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database file described by `config`.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect_with(options)
            .await?;

        info!("Opened document store at {}", config.database_path.display());
        Self::with_pool(pool).await
    }

    /// Private in-memory database; the single connection is kept alive for
    /// the lifetime of the pool.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_TENANT_INDEX).execute(&pool).await?;
        Ok(Self { pool })
    }
}

/// Escape LIKE wildcards so `q` matches literally.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn record_from_row(row: &SqliteRow) -> Result<DocumentRecord, StoreError> {
    let document_type: String = row.try_get("document_type")?;
    let type_metadata: String = row.try_get("type_metadata")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(DocumentRecord {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        document_type: document_type.parse().map_err(StoreError::InvalidRecord)?,
        blob_ref: row.try_get("blob_ref")?,
        url: row.try_get("url")?,
        type_metadata: serde_json::from_str(&type_metadata)?,
        owner_id: row.try_get("owner_id")?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
        altitude_m: row.try_get("altitude_m")?,
        created_at,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn search(&self, params: &SearchParams) -> Result<Vec<DocumentRecord>, StoreError> {
        let limit = params.limit.max(0);
        let radius = params.radius();

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE tenant_id = ").push_bind(params.tenant_id.clone());

        if let Some(document_type) = params.document_type {
            qb.push(" AND document_type = ").push_bind(document_type.as_str());
        }

        if let Some(q) = &params.q {
            let pattern = like_pattern(q);
            qb.push(" AND (type_metadata LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR url LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR blob_ref LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if radius.is_some() {
            qb.push(" AND lat IS NOT NULL AND lon IS NOT NULL");
        }

        qb.push(" ORDER BY id DESC");

        // Radius filtering happens after the fetch, so the limit can only be
        // pushed down when there is none.
        if radius.is_none() {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let Some((lat, lon, distance_mi)) = radius else {
            return Ok(records);
        };

        Ok(records
            .into_iter()
            .filter(|r| match (r.lat, r.lon) {
                (Some(rlat), Some(rlon)) => haversine_miles(lat, lon, rlat, rlon) <= distance_mi,
                _ => false,
            })
            .take(limit as usize)
            .collect())
    }

    async fn insert(&self, document: NewDocument) -> Result<i64, StoreError> {
        let type_metadata = serde_json::to_string(&document.type_metadata)?;

        let result = sqlx::query(
            r#"
            INSERT INTO library_documents
                (tenant_id, document_type, blob_ref, url, type_metadata, owner_id, lat, lon, altitude_m, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.tenant_id)
        .bind(document.document_type.as_str())
        .bind(&document.blob_ref)
        .bind(&document.url)
        .bind(type_metadata)
        .bind(&document.owner_id)
        .bind(document.lat)
        .bind(document.lon)
        .bind(document.altitude_m)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64, tenant_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let sql = format!("{} WHERE id = ? AND tenant_id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::DocumentType;
    use serde_json::json;

    fn new_doc(tenant: &str, document_type: DocumentType) -> NewDocument {
        NewDocument {
            tenant_id: tenant.to_string(),
            document_type,
            blob_ref: None,
            url: None,
            type_metadata: json!({}),
            owner_id: None,
            lat: None,
            lon: None,
            altitude_m: None,
        }
    }

    #[tokio::test]
    async fn insert_then_get_is_tenant_scoped() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();
        let mut doc = new_doc("acme", DocumentType::Image);
        doc.url = Some("https://cdn.test/a.png".to_string());
        doc.type_metadata = json!({"width": 640});
        let id = store.insert(doc).await.unwrap();

        let record = store.get(id, "acme").await.unwrap().expect("record");
        assert_eq!(record.document_type, DocumentType::Image);
        assert_eq!(record.url.as_deref(), Some("https://cdn.test/a.png"));
        assert_eq!(record.type_metadata, json!({"width": 640}));

        assert!(store.get(id, "globex").await.unwrap().is_none());
        assert!(store.get(id + 100, "acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_filters_by_tenant_type_and_text() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();
        let mut a = new_doc("acme", DocumentType::Video);
        a.type_metadata = json!({"title": "Harbor survey"});
        store.insert(a).await.unwrap();
        store.insert(new_doc("acme", DocumentType::Audio)).await.unwrap();
        store.insert(new_doc("globex", DocumentType::Video)).await.unwrap();

        let all = store.search(&SearchParams::for_tenant("acme")).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.tenant_id == "acme"));

        let mut by_type = SearchParams::for_tenant("acme");
        by_type.document_type = Some(DocumentType::Audio);
        assert_eq!(store.search(&by_type).await.unwrap().len(), 1);

        let mut by_text = SearchParams::for_tenant("acme");
        by_text.q = Some("harbor".to_string());
        let found = store.search(&by_text).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].document_type, DocumentType::Video);
    }

    #[tokio::test]
    async fn search_text_treats_wildcards_literally() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();
        store.insert(new_doc("acme", DocumentType::Data)).await.unwrap();

        let mut params = SearchParams::for_tenant("acme");
        params.q = Some("%".to_string());
        assert!(store.search(&params).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_applies_radius_and_limit() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();
        for (lat, lon) in [(40.7128, -74.0060), (40.7306, -73.9352), (34.0522, -118.2437)] {
            let mut doc = new_doc("acme", DocumentType::Document);
            doc.lat = Some(lat);
            doc.lon = Some(lon);
            store.insert(doc).await.unwrap();
        }
        store.insert(new_doc("acme", DocumentType::Document)).await.unwrap();

        let mut params = SearchParams::for_tenant("acme");
        params.lat = Some(40.7128);
        params.lon = Some(-74.0060);
        params.distance_mi = Some(25.0);
        assert_eq!(store.search(&params).await.unwrap().len(), 2);

        params.limit = 1;
        assert_eq!(store.search(&params).await.unwrap().len(), 1);

        let mut plain = SearchParams::for_tenant("acme");
        plain.limit = 3;
        assert_eq!(store.search(&plain).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn health_check_succeeds() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();
        store.health_check().await.unwrap();
    }
}
