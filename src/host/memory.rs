//! In-memory database and draft storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::{Database, DraftStorage};
use crate::error::Result;
use crate::models::{fs_path_from_id, StudioItem};

/// Insertion-ordered in-memory content projection.
///
/// Ids are `<collection>/<fsPath>`. Lookups by fs path resolve to the id of
/// an existing item first, so several collections can share one database.
pub struct MemoryDatabase<T> {
    collection: String,
    items: RwLock<Vec<T>>,
}

impl<T: StudioItem> MemoryDatabase<T> {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn with_items(collection: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            collection: collection.into(),
            items: RwLock::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl<T: StudioItem> Database<T> for MemoryDatabase<T> {
    async fn get(&self, id: &str) -> Result<Option<T>> {
        Ok(self.items.read().iter().find(|i| i.id() == id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.items.read().clone())
    }

    async fn upsert(&self, id: &str, item: T) -> Result<()> {
        let mut items = self.items.write();
        match items.iter_mut().find(|i| i.id() == id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.items.write().retain(|i| i.id() != id);
        Ok(())
    }

    fn fs_path(&self, id: &str) -> String {
        fs_path_from_id(id)
    }

    fn id_from_fs_path(&self, fs_path: &str) -> String {
        let fs_path = fs_path.trim_start_matches('/');
        self.items
            .read()
            .iter()
            .find(|i| i.fs_path() == fs_path)
            .map(|i| i.id().to_string())
            .unwrap_or_else(|| format!("{}/{}", self.collection, fs_path))
    }
}

/// Insertion-ordered in-memory key-value storage.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<Vec<(String, Value)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .entries
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => entries.push((key.to_string(), value)),
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.entries.write().retain(|(k, _)| k != key);
        Ok(())
    }

    async fn get_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().iter().map(|(k, _)| k.clone()).collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentItem;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_database_upsert_keeps_order() {
        let db: MemoryDatabase<DocumentItem> = MemoryDatabase::new("docs");
        db.upsert("docs/a.md", DocumentItem::new("docs/a.md"))
            .await
            .unwrap();
        db.upsert("docs/b.md", DocumentItem::new("docs/b.md"))
            .await
            .unwrap();

        let mut updated = DocumentItem::new("docs/a.md");
        updated.fields.insert("title".to_string(), json!("A"));
        db.upsert("docs/a.md", updated).await.unwrap();

        let ids: Vec<String> = db.list().await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["docs/a.md", "docs/b.md"]);
        assert_eq!(
            db.get("docs/a.md").await.unwrap().unwrap().fields["title"],
            "A"
        );

        db.delete("docs/a.md").await.unwrap();
        assert_eq!(db.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_database_id_resolution() {
        let db = MemoryDatabase::with_items(
            "docs",
            vec![DocumentItem::new("landing/index.md")],
        );

        assert_eq!(db.id_from_fs_path("index.md"), "landing/index.md");
        assert_eq!(db.id_from_fs_path("/guide/a.md"), "docs/guide/a.md");
        assert_eq!(db.fs_path("docs/guide/a.md"), "guide/a.md");
    }

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.set_item("b", json!(1)).await.unwrap();
        storage.set_item("a", json!(2)).await.unwrap();
        storage.set_item("b", json!(3)).await.unwrap();

        assert_eq!(storage.get_keys().await.unwrap(), vec!["b", "a"]);
        assert_eq!(storage.get_item("b").await.unwrap(), Some(json!(3)));

        storage.remove_item("b").await.unwrap();
        assert_eq!(storage.get_item("b").await.unwrap(), None);

        storage.clear().await.unwrap();
        assert!(storage.get_keys().await.unwrap().is_empty());
    }
}
