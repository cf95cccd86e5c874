//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::local::LocalContentStorage;
use crate::traits::{ContentHash, ContentStorage, StorageError, StorageResult, UploadOptions};

/// Content-addressed storage held entirely in memory. Used by tests and by
/// guest sessions that never publish durably.
#[derive(Default)]
pub struct MemoryContentStorage {
    objects: Mutex<HashMap<ContentHash, Bytes>>,
}

impl MemoryContentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStorage for MemoryContentStorage {
    async fn upload(&self, data: Bytes, opts: &UploadOptions) -> StorageResult<ContentHash> {
        let hash = LocalContentStorage::content_hash(&data);
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.entry(hash.clone()).or_insert(data);
        tracing::debug!(%hash, filename = %opts.filename, "content stored in memory");
        Ok(hash)
    }

    async fn retrieve(&self, hash: &ContentHash) -> StorageResult<Bytes> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .get(hash)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(hash.to_string()))
    }

    async fn exists(&self, hash: &ContentHash) -> StorageResult<bool> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects.contains_key(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_retrieve_round_trip() {
        let storage = MemoryContentStorage::new();
        let data = Bytes::from_static(b"in-memory audio");
        let opts = UploadOptions {
            filename: "take.mp3".to_string(),
            content_type: "audio/mpeg".to_string(),
            duration_secs: None,
        };
        let hash = storage.upload(data.clone(), &opts).await.unwrap();
        assert_eq!(storage.retrieve(&hash).await.unwrap(), data);
        assert_eq!(storage.len(), 1);

        // Re-uploading the same bytes does not grow the store.
        storage.upload(data, &opts).await.unwrap();
        assert_eq!(storage.len(), 1);
    }
}
