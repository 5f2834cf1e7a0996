use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const FALLBACK_EXTENSION: &str = ".bin";
const MAX_EXTENSION_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob '{0}' not found in uploads directory")]
    Missing(String),

    #[error("uploads directory I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Uploaded blobs, stored flat in a single directory under content-derived names.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Use `root` as the uploads directory, creating it if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|source| BlobError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage name for an upload: SHA-256 of the content as 64 hex chars,
    /// plus the original file's extension or `.bin`.
    pub fn storage_name(original_filename: &str, content: &[u8]) -> String {
        let digest = Sha256::digest(content);
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}{}", hex, extension_of(original_filename))
    }

    /// Write `content` and return its storage name.
    ///
    /// The bytes go to a unique temp file first and are renamed into place, so
    /// concurrent uploads of the same content never interleave.
    pub async fn save(&self, original_filename: &str, content: &[u8]) -> Result<String, BlobError> {
        let name = Self::storage_name(original_filename, content);
        let target = self.root.join(&name);
        let tmp = self.root.join(format!(".{}.part", Uuid::new_v4().simple()));

        let io_err = |path: &Path, source| BlobError::Io {
            path: path.to_path_buf(),
            source,
        };

        tokio::fs::write(&tmp, content).await.map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(&target, e));
        }

        debug!(blob_ref = %name, bytes = content.len(), "stored upload");
        Ok(name)
    }

    /// Path of a stored blob, if `blob_ref` names a file that exists.
    pub async fn resolve(&self, blob_ref: &str) -> Result<PathBuf, BlobError> {
        if !is_plain_name(blob_ref) {
            return Err(BlobError::Missing(blob_ref.to_string()));
        }

        let path = self.root.join(blob_ref);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(BlobError::Missing(blob_ref.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::Missing(blob_ref.to_string()))
            }
            Err(source) => Err(BlobError::Io { path, source }),
        }
    }
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Stored names never contain separators or start with a dot.
fn is_plain_name(blob_ref: &str) -> bool {
    !blob_ref.is_empty()
        && !blob_ref.starts_with('.')
        && !blob_ref.contains(['/', '\\'])
}
