//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── last_id.txt           # Checkpoint
//! └── stats.json            # Last run report
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::CheckpointStore;

const CHECKPOINT_KEY: &str = "last_id.txt";
const REPORT_KEY: &str = "stats.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist the report of the last run.
    pub async fn save_report<T: Serialize + ?Sized>(&self, report: &T) -> Result<()> {
        self.write_json(REPORT_KEY, report).await
    }

    /// Load the report of the last run as loose JSON.
    pub async fn load_report(&self) -> Result<Option<serde_json::Value>> {
        self.read_json(REPORT_KEY).await
    }
}

#[async_trait]
impl CheckpointStore for LocalStorage {
    async fn load(&self) -> Result<Option<u64>> {
        let Some(bytes) = self.read_bytes(CHECKPOINT_KEY).await? else {
            return Ok(None);
        };

        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim();
        if text.is_empty() {
            log::warn!("Empty checkpoint at {}", self.location());
            return Ok(None);
        }

        text.parse::<u64>()
            .map(Some)
            .map_err(|e| AppError::checkpoint(self.path(CHECKPOINT_KEY), format!("'{}': {}", text, e)))
    }

    async fn save(&self, id: u64) -> Result<()> {
        self.write_bytes(CHECKPOINT_KEY, id.to_string().as_bytes())
            .await
    }

    fn location(&self) -> String {
        self.path(CHECKPOINT_KEY).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!storage.path("test.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_checkpoint_is_none() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_checkpoint_roundtrip_and_overwrite() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested"));

        storage.save(101).await.unwrap();
        storage.save(104).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), Some(104));
        let raw = std::fs::read_to_string(tmp.path().join("nested/last_id.txt")).unwrap();
        assert_eq!(raw, "104");
    }

    #[tokio::test]
    async fn test_checkpoint_tolerates_whitespace() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("last_id.txt"), " 2931\n").unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert_eq!(storage.load().await.unwrap(), Some(2931));
    }

    #[tokio::test]
    async fn test_empty_checkpoint_is_none() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("last_id.txt"), "\n").unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("last_id.txt"), "abc").unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(matches!(
            storage.load().await,
            Err(AppError::Checkpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_report_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .save_report(&serde_json::json!({ "delivered": 2 }))
            .await
            .unwrap();
        let report = storage.load_report().await.unwrap().unwrap();
        assert_eq!(report["delivered"], 2);
    }
}
