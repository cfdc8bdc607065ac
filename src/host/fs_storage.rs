//! Draft storage persisted as one JSON file per namespace.
//!
//! Each namespace (`documents`, `medias`) maps to `<dir>/<namespace>.json`
//! holding an ordered list of `{ key, value }` entries. Every write goes
//! through a temp file + rename so a crash never leaves a truncated file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use super::DraftStorage;
use crate::error::{Result, StudioError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    value: Value,
}

pub struct FsStorage {
    path: PathBuf,
    // serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FsStorage {
    pub fn new(dir: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", namespace)),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Vec<StoredEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            StudioError::Storage(format!("Corrupt draft file {:?}: {}", self.path, e))
        })
    }

    async fn write_entries(&self, entries: &[StoredEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DraftStorage for FsStorage {
    async fn get_item(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let entries = self.read_entries().await?;
        Ok(entries.into_iter().find(|e| e.key == key).map(|e| e.value))
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;

        match entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value,
            None => entries.push(StoredEntry {
                key: key.to_string(),
                value,
            }),
        }

        self.write_entries(&entries).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        let before = entries.len();
        entries.retain(|e| e.key != key);

        if entries.len() != before {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }

    async fn get_keys(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_entries()
            .await?
            .into_iter()
            .map(|e| e.key)
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await?;
        }
        tracing::debug!("[draft] Cleared draft storage at {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_storage_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        let storage = FsStorage::new(temp_dir.path(), "documents");
        storage
            .set_item("docs/b.md", json!({ "status": "updated" }))
            .await
            .unwrap();
        storage
            .set_item("docs/a.md", json!({ "status": "created" }))
            .await
            .unwrap();

        let reopened = FsStorage::new(temp_dir.path(), "documents");
        assert_eq!(
            reopened.get_keys().await.unwrap(),
            vec!["docs/b.md", "docs/a.md"]
        );
        assert_eq!(
            reopened.get_item("docs/a.md").await.unwrap(),
            Some(json!({ "status": "created" }))
        );
        assert!(!temp_dir.path().join("documents.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_fs_storage_namespaces_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let documents = FsStorage::new(temp_dir.path(), "documents");
        let medias = FsStorage::new(temp_dir.path(), "medias");

        documents.set_item("k", json!(1)).await.unwrap();
        assert!(medias.get_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_storage_remove_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path().join("nested"), "documents");

        storage.set_item("a", json!(1)).await.unwrap();
        storage.set_item("b", json!(2)).await.unwrap();
        storage.remove_item("a").await.unwrap();
        assert_eq!(storage.get_keys().await.unwrap(), vec!["b"]);

        storage.clear().await.unwrap();
        assert!(!storage.path().exists());
        assert!(storage.get_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_storage_reports_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("documents.json"), "{not json").unwrap();

        let storage = FsStorage::new(temp_dir.path(), "documents");
        let err = storage.get_keys().await.unwrap_err();
        assert!(matches!(err, StudioError::Storage(_)));
    }
}
