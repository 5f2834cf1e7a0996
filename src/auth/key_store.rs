use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::api::parse_json_or_default;
use crate::config::SecurityConfig;

/// Errors from persisting the tenant key mapping
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("failed to write tenant keys file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode tenant keys: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Tenant -> API key mapping plus the optional global fallback key.
///
/// The mapping is merged from the environment JSON and the key file on first
/// use. Writers hold the write lock across the file rewrite, so concurrent
/// issuance never interleaves on disk.
pub struct KeyStore {
    env_json: Option<String>,
    file: Option<PathBuf>,
    global_key: Option<String>,
    keys: OnceCell<RwLock<BTreeMap<String, String>>>,
}

impl KeyStore {
    pub fn new(env_json: Option<String>, file: Option<PathBuf>, global_key: Option<String>) -> Self {
        Self {
            env_json,
            file,
            global_key: global_key.filter(|k| !k.is_empty()),
            keys: OnceCell::new(),
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            security.tenant_keys_json.clone(),
            security.tenant_keys_file.clone(),
            security.global_api_key.clone(),
        )
    }

    /// Whether issued keys survive a restart.
    pub fn persists_to_disk(&self) -> bool {
        self.file.is_some()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    async fn mapping(&self) -> &RwLock<BTreeMap<String, String>> {
        self.keys
            .get_or_init(|| async { RwLock::new(self.load().await) })
            .await
    }

    async fn load(&self) -> BTreeMap<String, String> {
        let mut keys = BTreeMap::new();

        if let Some(raw) = &self.env_json {
            keys.extend(key_entries(raw, "CONTINUUM_TENANT_KEYS"));
        }

        if let Some(path) = &self.file {
            match tokio::fs::read_to_string(path).await {
                Ok(raw) => {
                    // File entries win over the environment on collision.
                    keys.extend(key_entries(&raw, &path.display().to_string()));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Tenant keys file {} does not exist yet", path.display());
                }
                Err(e) => {
                    warn!("Ignoring unreadable tenant keys file {}: {}", path.display(), e);
                }
            }
        }

        info!("Loaded {} tenant key(s)", keys.len());
        keys
    }

    /// Key a request for `tenant` must present, or `None` when the tenant is open.
    ///
    /// An explicit tenant entry always wins; the global key only covers tenants
    /// without one.
    pub async fn resolve_required_key(&self, tenant: &str) -> Option<String> {
        let keys = self.mapping().await.read().await;
        match keys.get(tenant) {
            Some(key) if !key.is_empty() => Some(key.clone()),
            _ => self.global_key.clone(),
        }
    }

    /// Set `tenant`'s key, rewriting the key file first when one is configured.
    ///
    /// The in-memory mapping only changes once the file write succeeded.
    pub async fn persist(&self, tenant: &str, key: &str) -> Result<(), KeyStoreError> {
        let mut keys = self.mapping().await.write().await;

        match &self.file {
            Some(path) => {
                let mut next = keys.clone();
                next.insert(tenant.to_string(), key.to_string());
                write_keys_file(path, &next).await?;
                *keys = next;
            }
            None => {
                keys.insert(tenant.to_string(), key.to_string());
            }
        }

        Ok(())
    }
}

/// Tenant -> key entries of one JSON object.
///
/// A value that is not a string is kept as an empty key, which marks the
/// tenant as having no key of its own (and still overrides an earlier source)
/// without discarding the rest of the object.
fn key_entries(raw: &str, source: &str) -> BTreeMap<String, String> {
    parse_json_or_default::<Map<String, Value>>(raw, source)
        .into_iter()
        .map(|(tenant, value)| match value {
            Value::String(key) => (tenant, key),
            other => {
                warn!(source = %source, tenant = %tenant, value = %other, "tenant key entry is not a string, treating it as unset");
                (tenant, String::new())
            }
        })
        .collect()
}

async fn write_keys_file(path: &Path, keys: &BTreeMap<String, String>) -> Result<(), KeyStoreError> {
    let io_err = |source| KeyStoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let body = serde_json::to_vec_pretty(keys)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
