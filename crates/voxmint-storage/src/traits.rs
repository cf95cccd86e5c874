//! Storage abstraction trait
//!
//! All content storage backends implement [`ContentStorage`]. Uploads are
//! addressed by content: the same bytes always yield the same hash, so
//! re-uploading is idempotent by construction.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Hash addressing one stored payload (lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied upload attributes. The backend does not decode audio;
/// duration travels alongside the payload for display purposes only.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub filename: String,
    pub content_type: String,
    pub duration_secs: Option<f64>,
}

/// Content-addressed storage abstraction.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    /// Store `data` and return its content hash.
    async fn upload(&self, data: Bytes, opts: &UploadOptions) -> StorageResult<ContentHash>;

    /// Fetch a payload by hash.
    async fn retrieve(&self, hash: &ContentHash) -> StorageResult<Bytes>;

    /// Whether a payload with this hash is stored.
    async fn exists(&self, hash: &ContentHash) -> StorageResult<bool>;
}
