//! The draft store: staged changes for one item kind.
//!
//! Every mutator writes storage first, then the in-memory list, then the
//! database projection, and finally publishes a `draft:<kind>:updated` event.
//! Mutations of the same id are serialized through [`KeyedLocks`]; the list
//! itself is a copy-on-write `Vec` whose lock is never held across an await.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;

use super::conflict::ConflictDetector;
use super::locks::KeyedLocks;
use super::status::{derive_status, find_descendant_ids, is_same_or_descendant};
use super::RenameRequest;
use crate::error::{Result, StudioError};
use crate::events::{EventBus, StudioEvent};
use crate::host::{ContentConverter, Database, DraftStorage};
use crate::models::{DraftItem, DraftStatus, ItemKind, StudioItem};
use crate::repository::{join_path, FetchOptions, RemoteFile, RepositoryClient};

/// Lookups resolved before an item is moved to a new path.
pub(crate) struct RenamePlan<T> {
    /// Payload to carry over to the new path.
    pub current: T,
    /// Baseline the new draft is compared against.
    pub original: Option<T>,
    pub new_id: String,
}

pub struct DraftStore<T: StudioItem> {
    db: Arc<dyn Database<T>>,
    storage: Arc<dyn DraftStorage>,
    repository: Arc<dyn RepositoryClient>,
    converter: Arc<dyn ContentConverter>,
    conflicts: ConflictDetector,
    bus: Arc<EventBus>,
    list: RwLock<Arc<Vec<DraftItem<T>>>>,
    current: RwLock<Option<String>>,
    locks: KeyedLocks,
}

impl<T: StudioItem> DraftStore<T> {
    pub fn new(
        db: Arc<dyn Database<T>>,
        storage: Arc<dyn DraftStorage>,
        repository: Arc<dyn RepositoryClient>,
        converter: Arc<dyn ContentConverter>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            db,
            storage,
            repository,
            conflicts: ConflictDetector::new(converter.clone()),
            converter,
            bus,
            list: RwLock::new(Arc::new(Vec::new())),
            current: RwLock::new(None),
            locks: KeyedLocks::new(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        T::KIND
    }

    pub fn database(&self) -> &Arc<dyn Database<T>> {
        &self.db
    }

    pub(crate) fn converter(&self) -> &Arc<dyn ContentConverter> {
        &self.converter
    }

    pub(crate) fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    pub fn get(&self, id: &str) -> Option<DraftItem<T>> {
        self.list.read().iter().find(|d| d.id == id).cloned()
    }

    /// Snapshot of the draft list, in insertion order.
    pub fn list(&self) -> Arc<Vec<DraftItem<T>>> {
        self.list.read().clone()
    }

    /// Drafts carrying an actual change.
    pub fn pending(&self) -> Vec<DraftItem<T>> {
        self.list
            .read()
            .iter()
            .filter(|d| d.status != DraftStatus::Pristine)
            .cloned()
            .collect()
    }

    pub fn current(&self) -> Option<DraftItem<T>> {
        let id = self.current.read().clone()?;
        self.get(&id)
    }

    pub fn unselect(&self) {
        *self.current.write() = None;
    }

    /// Stage `modified`, compared against `original`.
    pub async fn create(&self, modified: T, original: Option<T>) -> Result<DraftItem<T>> {
        let draft = {
            let _guard = self.locks.lock(modified.id()).await;
            self.create_inner(modified, original).await?
        };
        self.publish("DraftStore.create").await;
        Ok(draft)
    }

    /// Create without taking the id lock or publishing. Callers hold the lock.
    pub(crate) async fn create_inner(&self, modified: T, original: Option<T>) -> Result<DraftItem<T>> {
        let id = modified.id().to_string();
        if self.get(&id).is_some() {
            return Err(StudioError::DraftAlreadyExists(id));
        }

        let fs_path = self.db.fs_path(&id);
        let remote_file = self.fetch_remote(&fs_path).await;
        let status = derive_status(&modified, original.as_ref());

        let mut draft = DraftItem {
            id,
            fs_path,
            status,
            original,
            modified: Some(modified.clone()),
            remote_file,
            conflict: None,
        };
        draft.conflict = self.conflicts.check(&draft).await;

        self.persist(&draft).await?;
        self.push(draft.clone());
        self.db.upsert(&draft.id, modified).await?;

        tracing::debug!("[draft] Created {} draft {} ({})", T::KIND.label(), draft.id, draft.status);
        Ok(draft)
    }

    /// Replace the staged payload of an existing draft.
    pub async fn update(&self, id: &str, modified: T) -> Result<DraftItem<T>> {
        let (draft, previous_status) = {
            let _guard = self.locks.lock(id).await;
            let existing = self
                .get(id)
                .ok_or_else(|| StudioError::NoCorrespondingEntry(id.to_string()))?;

            let previous_status = existing.status;
            let status = derive_status(&modified, existing.original.as_ref());
            let draft = DraftItem {
                status,
                modified: Some(modified.clone()),
                ..existing
            };

            self.persist(&draft).await?;
            self.replace(draft.clone());
            self.db.upsert(id, modified).await?;
            (draft, previous_status)
        };

        let status = draft.status;
        if status != previous_status {
            tracing::debug!("[draft] {} is now {}", id, status);
            self.publish("DraftStore.update").await;
        }
        Ok(draft)
    }

    /// Stage deletions. Directory ids expand to everything below them.
    pub async fn remove(&self, ids: &[String]) -> Result<()> {
        let ids = self.expand_ids(ids).await?;

        for id in ids {
            let removed = {
                let _guard = self.locks.lock(&id).await;
                self.remove_one(&id).await?
            };
            if removed {
                self.publish("DraftStore.remove").await;
            }
        }
        Ok(())
    }

    /// Remove one id without publishing. Callers hold the id lock.
    ///
    /// Returns whether anything changed.
    pub(crate) async fn remove_one(&self, id: &str) -> Result<bool> {
        match self.get(id) {
            Some(existing) if existing.status == DraftStatus::Deleted => Ok(false),
            Some(existing) if existing.status == DraftStatus::Created => {
                self.storage.remove_item(id).await?;
                self.drop_draft(id);
                self.db.delete(id).await?;
                tracing::debug!("[draft] Dropped created draft {}", id);
                Ok(true)
            }
            Some(existing) => {
                let draft = DraftItem {
                    status: DraftStatus::Deleted,
                    modified: None,
                    conflict: None,
                    ..existing
                };
                self.persist(&draft).await?;
                self.replace(draft);
                self.db.delete(id).await?;
                tracing::debug!("[draft] Marked {} as deleted", id);
                Ok(true)
            }
            None => {
                let Some(item) = self.db.get(id).await? else {
                    tracing::warn!("[draft] Nothing to remove for {}", id);
                    return Ok(false);
                };

                let fs_path = self.db.fs_path(id);
                let remote_file = self.fetch_remote(&fs_path).await;
                let draft = DraftItem {
                    id: id.to_string(),
                    fs_path,
                    status: DraftStatus::Deleted,
                    original: Some(item),
                    modified: None,
                    remote_file,
                    conflict: None,
                };
                self.persist(&draft).await?;
                self.push(draft);
                self.db.delete(id).await?;
                tracing::debug!("[draft] Marked {} as deleted", id);
                Ok(true)
            }
        }
    }

    /// Undo the drafts at or below `id`.
    ///
    /// Created drafts disappear, and a rename also restores the item it was
    /// renamed from. Everything else goes back to its original.
    pub async fn revert(&self, id: &str) -> Result<()> {
        let mut queue: VecDeque<String> = find_descendant_ids(&self.list(), id).into();
        let mut visited = HashSet::new();
        let mut reverted = 0usize;

        while let Some(draft_id) = queue.pop_front() {
            if !visited.insert(draft_id.clone()) {
                continue;
            }

            let _guard = self.locks.lock(&draft_id).await;
            let Some(existing) = self.get(&draft_id) else {
                tracing::debug!("[draft] {} is no longer a draft", draft_id);
                continue;
            };

            if existing.status == DraftStatus::Created {
                self.storage.remove_item(&draft_id).await?;
                self.drop_draft(&draft_id);
                self.db.delete(&draft_id).await?;

                if let Some(original) = existing.original.as_ref() {
                    if original.id() != draft_id {
                        queue.extend(find_descendant_ids(&self.list(), original.id()));
                    }
                }
            } else {
                let Some(original) = existing.original.clone() else {
                    tracing::warn!("[draft] {} has no original to revert to", draft_id);
                    continue;
                };
                let draft = DraftItem {
                    status: DraftStatus::Pristine,
                    modified: Some(original.clone()),
                    ..existing
                };
                self.persist(&draft).await?;
                self.replace(draft);
                self.db.upsert(&draft_id, original).await?;
            }
            reverted += 1;
        }

        if reverted > 0 {
            tracing::debug!("[draft] Reverted {} draft(s) under {}", reverted, id);
            self.publish("DraftStore.revert").await;
        }
        Ok(())
    }

    /// Undo every draft and forget them.
    pub async fn revert_all(&self) -> Result<()> {
        self.storage.clear().await?;
        let drafts = std::mem::take(&mut *self.list.write());
        self.unselect();

        for draft in drafts.iter() {
            if draft.status == DraftStatus::Created {
                self.db.delete(&draft.id).await?;
            } else if let Some(original) = draft.original.clone() {
                self.db.upsert(&draft.id, original).await?;
            }
        }

        tracing::info!("[draft] Reverted all {} draft(s)", drafts.len());
        self.publish("DraftStore.revertAll").await;
        Ok(())
    }

    /// Restore persisted drafts and re-apply them onto the projection.
    ///
    /// Pristine drafts are evicted from storage.
    pub async fn load(&self) -> Result<()> {
        let keys = self.storage.get_keys().await?;
        let mut drafts = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(value) = self.storage.get_item(&key).await? else {
                continue;
            };
            let draft: DraftItem<T> = match serde_json::from_value(value) {
                Ok(draft) => draft,
                Err(e) => {
                    tracing::warn!("[draft] Skipping unreadable draft {}: {}", key, e);
                    continue;
                }
            };

            if draft.status == DraftStatus::Pristine {
                self.storage.remove_item(&key).await?;
                continue;
            }

            match (&draft.status, &draft.modified) {
                (DraftStatus::Deleted, _) => self.db.delete(&draft.id).await?,
                (_, Some(modified)) => self.db.upsert(&draft.id, modified.clone()).await?,
                _ => {}
            }
            drafts.push(draft);
        }

        tracing::info!("[draft] Loaded {} {} draft(s)", drafts.len(), T::KIND.label());
        *self.list.write() = Arc::new(drafts);
        self.publish("DraftStore.load").await;
        Ok(())
    }

    /// Make `id` the current draft, opening it from the database if needed.
    pub async fn select(&self, id: &str) -> Result<DraftItem<T>> {
        let (draft, opened) = {
            let _guard = self.locks.lock(id).await;
            match self.get(id) {
                Some(draft) => (draft, false),
                None => {
                    let item = self
                        .db
                        .get(id)
                        .await?
                        .ok_or_else(|| StudioError::NoCorrespondingEntry(id.to_string()))?;
                    (self.create_inner(item.clone(), Some(item)).await?, true)
                }
            }
        };

        *self.current.write() = Some(draft.id.clone());
        if opened {
            self.publish("DraftStore.create").await;
        }
        Ok(draft)
    }

    /// Select by path, matching drafts before deriving an id from the database.
    pub async fn select_by_fs_path(&self, fs_path: &str) -> Result<DraftItem<T>> {
        let id = self
            .list()
            .iter()
            .find(|d| d.fs_path == fs_path)
            .map(|d| d.id.clone())
            .unwrap_or_else(|| self.db.id_from_fs_path(fs_path));
        self.select(&id).await
    }

    /// Forget every draft without touching the projection.
    pub async fn clear(&self) -> Result<()> {
        self.storage.clear().await?;
        *self.list.write() = Arc::new(Vec::new());
        self.unselect();
        self.publish("DraftStore.clear").await;
        Ok(())
    }

    /// Resolve a rename request against the current state.
    pub(crate) async fn plan_rename(&self, request: &RenameRequest) -> Result<RenamePlan<T>> {
        let db_item = self
            .db
            .get(&request.id)
            .await?
            .ok_or_else(|| StudioError::NoCorrespondingEntry(request.id.clone()))?;

        let new_id = self.db.id_from_fs_path(&request.new_fs_path);
        if new_id == request.id {
            return Err(StudioError::DraftAlreadyExists(new_id));
        }
        if self.get(&new_id).is_some() || self.db.get(&new_id).await?.is_some() {
            return Err(StudioError::DraftAlreadyExists(new_id));
        }

        let existing = self.get(&request.id);
        let current = existing
            .as_ref()
            .and_then(|d| d.modified.clone())
            .unwrap_or_else(|| db_item.clone());
        let original = match existing {
            Some(draft) => draft.original,
            None => Some(db_item),
        };

        Ok(RenamePlan {
            current,
            original,
            new_id,
        })
    }

    pub(crate) async fn publish(&self, caller: &str) {
        self.bus
            .publish(StudioEvent::draft_updated(T::KIND, caller))
            .await;
    }

    async fn fetch_remote(&self, fs_path: &str) -> Option<RemoteFile> {
        let path = join_path(&[T::KIND.remote_dir(), fs_path]);
        self.repository
            .fetch_file(&path, FetchOptions::cached())
            .await
    }

    async fn expand_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        let items = self.db.list().await?;
        let drafts = self.list();
        let mut expanded: Vec<String> = Vec::new();

        for id in ids {
            let mut matches: Vec<String> = items
                .iter()
                .map(|item| item.id())
                .filter(|candidate| is_same_or_descendant(candidate, id))
                .map(str::to_string)
                .collect();
            matches.extend(find_descendant_ids(&drafts, id));
            if matches.is_empty() {
                matches.push(id.clone());
            }

            for candidate in matches {
                if !expanded.contains(&candidate) {
                    expanded.push(candidate);
                }
            }
        }
        Ok(expanded)
    }

    async fn persist(&self, draft: &DraftItem<T>) -> Result<()> {
        let value = serde_json::to_value(draft)?;
        self.storage.set_item(&draft.id, value).await
    }

    fn push(&self, draft: DraftItem<T>) {
        let mut list = self.list.write();
        Arc::make_mut(&mut list).push(draft);
    }

    fn replace(&self, draft: DraftItem<T>) {
        let mut list = self.list.write();
        let drafts = Arc::make_mut(&mut list);
        match drafts.iter_mut().find(|d| d.id == draft.id) {
            Some(existing) => *existing = draft,
            None => drafts.push(draft),
        }
    }

    fn drop_draft(&self, id: &str) {
        let mut list = self.list.write();
        Arc::make_mut(&mut list).retain(|d| d.id != id);
    }
}
