//! Content store implementation
//!
//! File-based content-addressed storage. Content lives at
//! `data_dir/<d[0..2]>/<d[2..4]>/.../<digest>`, one shard directory per
//! level of `directory_depth`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use lineage_core::{HashAlgorithm, HashKey};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::StoreError;

/// Configuration for the content store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base directory for stored content
    pub data_dir: PathBuf,
    /// Directory for in-progress writes
    ///
    /// Must be on the same filesystem as `data_dir` so that renames are
    /// atomic.
    pub tmp_dir: PathBuf,
    /// Number of shard directory levels
    pub directory_depth: u8,
    /// Algorithm used when the store computes keys itself
    pub hash_algorithm: HashAlgorithm,
    /// Maximum content size (bytes)
    pub max_content_size: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_data_dir("./data/content")
    }
}

impl StoreConfig {
    /// Create a configuration rooted at `data_dir`, with temp files under it
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            tmp_dir: data_dir.join("tmp"),
            data_dir,
            directory_depth: 2, // e.g., ab/cd/abcdef...
            hash_algorithm: HashAlgorithm::Sha256,
            max_content_size: 4 * 1024 * 1024 * 1024, // 4GB
        }
    }

    /// Set the temp directory
    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = tmp_dir.into();
        self
    }

    /// Set the number of shard levels
    pub fn with_directory_depth(mut self, depth: u8) -> Self {
        self.directory_depth = depth;
        self
    }

    /// Set the maximum content size
    pub fn with_max_content_size(mut self, max: u64) -> Self {
        self.max_content_size = max;
        self
    }
}

/// A stored content entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub key: HashKey,
    /// Size in bytes
    pub size: u64,
}

/// Content-addressed store keyed by [`HashKey`]
pub struct ContentStore {
    config: StoreConfig,
}

impl ContentStore {
    /// Create a new content store
    pub async fn new(config: StoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.data_dir).await?;
        fs::create_dir_all(&config.tmp_dir).await?;

        info!(
            path = %config.data_dir.display(),
            depth = config.directory_depth,
            "Content store initialized"
        );

        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load content by key, `None` if absent
    ///
    /// Content under a computable key is verified on read.
    #[instrument(skip(self), fields(key = %key.short_digest()))]
    pub async fn get(&self, key: &HashKey) -> Result<Option<Bytes>, StoreError> {
        let path = self.content_path(key);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if let Some(actual) = key.algorithm().compute(&data)
            && &actual != key
        {
            warn!(expected = %key, actual = %actual, "Stored content hash mismatch");
            return Err(StoreError::HashMismatch {
                expected: key.clone(),
                actual,
            });
        }

        debug!(size = data.len(), "Loaded content");
        Ok(Some(Bytes::from(data)))
    }

    /// Store content under `key`
    ///
    /// Bytes under a computable key must reproduce it. Writing the same key
    /// twice is harmless: the later rename replaces identical content.
    #[instrument(skip(self, data), fields(key = %key.short_digest(), size = data.len()))]
    pub async fn put(&self, key: &HashKey, data: &[u8]) -> Result<(), StoreError> {
        let size = data.len() as u64;
        if size > self.config.max_content_size {
            return Err(StoreError::CapacityExceeded {
                size,
                max: self.config.max_content_size,
            });
        }

        if let Some(actual) = key.algorithm().compute(data)
            && &actual != key
        {
            return Err(StoreError::HashMismatch {
                expected: key.clone(),
                actual,
            });
        }

        let path = self.content_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a unique temp file, then rename into place
        let temp_path = self.config.tmp_dir.join(Uuid::new_v4().to_string());
        let mut file = File::create(&temp_path).await?;
        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!("Stored content");
        Ok(())
    }

    /// Store content under a key computed with the configured algorithm
    pub async fn put_content(&self, data: &[u8]) -> Result<HashKey, StoreError> {
        let algorithm = self.config.hash_algorithm;
        let key = algorithm
            .compute(data)
            .ok_or(StoreError::UncomputableAlgorithm(algorithm))?;
        self.put(&key, data).await?;
        Ok(key)
    }

    /// Check if content exists
    pub async fn contains(&self, key: &HashKey) -> Result<bool, StoreError> {
        Ok(fs::try_exists(self.content_path(key)).await?)
    }

    /// Delete content by key
    #[instrument(skip(self), fields(key = %key.short_digest()))]
    pub async fn delete(&self, key: &HashKey) -> Result<bool, StoreError> {
        match fs::remove_file(self.content_path(key)).await {
            Ok(_) => {
                debug!("Deleted content");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Path at which `key` is stored
    pub fn content_path(&self, key: &HashKey) -> PathBuf {
        let digest = key.digest();
        let mut path = self.config.data_dir.clone();

        for i in 0..self.config.directory_depth as usize {
            let start = i * 2;
            let end = start + 2;
            if end <= digest.len() {
                path.push(&digest[start..end]);
            }
        }

        path.push(digest);
        path
    }

    /// List all stored content (for maintenance)
    pub async fn list_all(&self) -> Result<Vec<StoredContent>, StoreError> {
        let mut entries = Vec::new();
        self.collect(&self.config.data_dir, &mut entries).await?;
        Ok(entries)
    }

    /// Recursively collect stored entries
    fn collect<'a>(
        &'a self,
        dir: &'a Path,
        out: &'a mut Vec<StoredContent>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), StoreError>> + Send + 'a>>
    {
        Box::pin(async move {
            let mut entries = fs::read_dir(dir).await?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    if path != self.config.tmp_dir {
                        self.collect(&path, out).await?;
                    }
                } else if let Some(key) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(key_from_file_name)
                {
                    let size = entry.metadata().await?.len();
                    out.push(StoredContent { key, size });
                }
            }

            Ok(())
        })
    }

    /// Get total size of all stored content
    pub async fn total_size(&self) -> Result<u64, StoreError> {
        let entries = self.list_all().await?;
        Ok(entries.iter().map(|e| e.size).sum())
    }
}

/// Recover a key from a leaf file name; digest length selects the algorithm
fn key_from_file_name(name: &str) -> Option<HashKey> {
    let algorithm = HashAlgorithm::ALL
        .into_iter()
        .find(|a| a.digest_len() == name.len())?;
    HashKey::parse(&format!("{}{}/{}", HashKey::SCHEME, algorithm, name)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (ContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::with_data_dir(temp_dir.path().join("content"));
        let store = ContentStore::new(config).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _temp) = create_test_store().await;

        let data = b"Hello, content store!";
        let key = HashKey::sha256(data);
        store.put(&key, data).await.unwrap();

        let loaded = store.get(&key).await.unwrap().unwrap();
        assert_eq!(&loaded[..], data);
    }

    #[tokio::test]
    async fn test_absent_key() {
        let (store, _temp) = create_test_store().await;
        let key = HashKey::sha256(b"never stored");
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(!store.contains(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_layout() {
        let (store, temp) = create_test_store().await;
        let key = store.put_content(b"layout").await.unwrap();
        let digest = key.digest();

        let expected = temp
            .path()
            .join("content")
            .join(&digest[0..2])
            .join(&digest[2..4])
            .join(digest);
        assert_eq!(store.content_path(&key), expected);
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_idempotent_put() {
        let (store, _temp) = create_test_store().await;

        let key = store.put_content(b"Duplicate content").await.unwrap();
        store.put(&key, b"Duplicate content").await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all, vec![StoredContent { key, size: 17 }]);
    }

    #[tokio::test]
    async fn test_put_rejects_wrong_bytes() {
        let (store, _temp) = create_test_store().await;
        let key = HashKey::sha256(b"expected");
        let result = store.put(&key, b"something else").await;
        assert!(matches!(result, Err(StoreError::HashMismatch { .. })));
        assert!(!store.contains(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_uncomputable_key() {
        let (store, _temp) = create_test_store().await;
        let key = HashKey::parse("hash://md5/0123456789abcdef0123456789abcdef").unwrap();
        store.put(&key, b"trusted").await.unwrap();
        assert_eq!(&store.get(&key).await.unwrap().unwrap()[..], b"trusted");

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key, key);
    }

    #[tokio::test]
    async fn test_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::with_data_dir(temp_dir.path()).with_max_content_size(4);
        let store = ContentStore::new(config).await.unwrap();

        let result = store.put_content(b"too large").await;
        assert!(matches!(result, Err(StoreError::CapacityExceeded { size: 9, max: 4 })));
    }

    #[tokio::test]
    async fn test_corruption_detected() {
        let (store, _temp) = create_test_store().await;
        let key = store.put_content(b"Original data").await.unwrap();

        fs::write(store.content_path(&key), b"Corrupted!").await.unwrap();

        let result = store.get(&key).await;
        assert!(matches!(result, Err(StoreError::HashMismatch { .. })));
    }

    #[tokio::test]
    async fn test_delete_and_total_size() {
        let (store, _temp) = create_test_store().await;

        let keep = store.put_content(b"Keep me").await.unwrap();
        let drop = store.put_content(b"Delete me").await.unwrap();
        assert_eq!(store.total_size().await.unwrap(), 16);

        assert!(store.delete(&drop).await.unwrap());
        assert!(!store.delete(&drop).await.unwrap());
        assert!(store.contains(&keep).await.unwrap());
        assert_eq!(store.total_size().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_depth_zero() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::with_data_dir(temp_dir.path()).with_directory_depth(0);
        let store = ContentStore::new(config).await.unwrap();
        let key = store.put_content(b"flat").await.unwrap();
        assert_eq!(store.content_path(&key), temp_dir.path().join(key.digest()));
    }
}
