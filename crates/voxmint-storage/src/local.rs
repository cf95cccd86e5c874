//! Local filesystem storage, addressed by sha256 of the payload.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::keys::object_key;
use crate::traits::{ContentHash, ContentStorage, StorageError, StorageResult, UploadOptions};

/// Content-addressed objects under `base_path/objects/..`.
#[derive(Clone)]
pub struct LocalContentStorage {
    base_path: PathBuf,
}

impl LocalContentStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        Ok(Self { base_path })
    }

    fn hash_to_path(&self, hash: &ContentHash) -> PathBuf {
        self.base_path.join(object_key(hash))
    }

    pub fn content_hash(data: &[u8]) -> ContentHash {
        ContentHash(hex::encode(Sha256::digest(data)))
    }
}

#[async_trait]
impl ContentStorage for LocalContentStorage {
    async fn upload(&self, data: Bytes, opts: &UploadOptions) -> StorageResult<ContentHash> {
        let hash = Self::content_hash(&data);
        let path = self.hash_to_path(&hash);

        // Same bytes, same path: a second upload of identical content is a no-op.
        if fs::try_exists(&path).await? {
            tracing::debug!(%hash, filename = %opts.filename, "content already stored");
            return Ok(hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}: {}", path.display(), e)))?;
        tracing::info!(
            %hash,
            filename = %opts.filename,
            content_type = %opts.content_type,
            size = data.len(),
            "content stored"
        );
        Ok(hash)
    }

    async fn retrieve(&self, hash: &ContentHash) -> StorageResult<Bytes> {
        let path = self.hash_to_path(hash);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> StorageResult<bool> {
        Ok(fs::try_exists(&self.hash_to_path(hash)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> UploadOptions {
        UploadOptions {
            filename: "take-1.mp3".to_string(),
            content_type: "audio/mpeg".to_string(),
            duration_secs: Some(12.0),
        }
    }

    #[tokio::test]
    async fn upload_then_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalContentStorage::new(dir.path()).await.unwrap();

        let data = Bytes::from_static(b"some audio bytes");
        let hash = storage.upload(data.clone(), &opts()).await.unwrap();
        assert!(storage.exists(&hash).await.unwrap());
        assert_eq!(storage.retrieve(&hash).await.unwrap(), data);
    }

    #[tokio::test]
    async fn identical_content_yields_identical_hash() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalContentStorage::new(dir.path()).await.unwrap();

        let data = Bytes::from_static(b"same bytes");
        let first = storage.upload(data.clone(), &opts()).await.unwrap();
        let second = storage.upload(data, &opts()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn retrieve_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalContentStorage::new(dir.path()).await.unwrap();

        let missing = ContentHash("ff00".repeat(16));
        assert!(matches!(
            storage.retrieve(&missing).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(!storage.exists(&missing).await.unwrap());
    }
}
