//! Tree view state for one item kind.
//!
//! A [`TreeState`] is registered on the [`EventBus`](crate::events::EventBus)
//! and rebuilds its tree whenever the draft list of its kind changes. It also
//! tracks the selected node; selecting a file opens its draft.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::builder::build_tree;
use super::lookup::{find_item_from_fs_path, find_item_from_route, find_parent_from_fs_path};
use crate::draft::DraftStore;
use crate::error::Result;
use crate::events::{EventHandler, StudioEvent};
use crate::models::{DraftStatus, StudioItem, TreeItem, TreeItemType, TreeStatus};

/// Caller whose events rebuild the tree without touching the selection.
const LOAD_CALLER: &str = "DraftStore.load";

pub struct TreeState<T: StudioItem> {
    draft: Arc<DraftStore<T>>,
    tree: RwLock<Arc<Vec<TreeItem>>>,
    /// `None` selects the root.
    current_fs_path: RwLock<Option<String>>,
}

impl<T: StudioItem> TreeState<T> {
    pub fn new(draft: Arc<DraftStore<T>>) -> Self {
        Self {
            draft,
            tree: RwLock::new(Arc::new(Vec::new())),
            current_fs_path: RwLock::new(None),
        }
    }

    pub fn draft(&self) -> &Arc<DraftStore<T>> {
        &self.draft
    }

    pub fn tree(&self) -> Arc<Vec<TreeItem>> {
        self.tree.read().clone()
    }

    /// Rebuild from the database listing and the current draft list.
    ///
    /// With `reselect`, a selection that disappeared falls back to the root.
    pub async fn rebuild(&self, reselect: bool) -> Result<()> {
        let items = self.draft.database().list().await?;
        let drafts = self.draft.list();
        let tree = build_tree(&items, &drafts);
        tracing::debug!(
            "[tree] Rebuilt {} tree: {} item(s), {} draft(s)",
            T::KIND.label(),
            items.len(),
            drafts.len()
        );
        *self.tree.write() = Arc::new(tree);

        if reselect {
            let current = self.current_fs_path.read().clone();
            if let Some(fs_path) = current {
                if find_item_from_fs_path(&self.tree(), &fs_path).is_none() {
                    tracing::debug!("[tree] {} is gone, selecting root", fs_path);
                    self.select_root();
                }
            }
        }
        Ok(())
    }

    /// Synthetic root wrapping the whole tree.
    pub fn root_item(&self) -> TreeItem {
        let has_changes = self
            .draft
            .list()
            .iter()
            .any(|d| d.status != DraftStatus::Pristine);

        TreeItem {
            name: T::KIND.remote_dir().to_string(),
            fs_path: "/".to_string(),
            item_type: TreeItemType::Root,
            status: has_changes.then_some(TreeStatus::Updated),
            prefix: None,
            route_path: None,
            hidden: false,
            children: Some(self.tree().to_vec()),
        }
    }

    pub fn current_item(&self) -> TreeItem {
        let current = self.current_fs_path.read().clone();
        current
            .and_then(|fs_path| find_item_from_fs_path(&self.tree(), &fs_path).cloned())
            .unwrap_or_else(|| self.root_item())
    }

    /// Children of the selected node. Files have none.
    pub fn current_children(&self) -> Vec<TreeItem> {
        self.current_item().children.unwrap_or_default()
    }

    /// Select the node at `fs_path`, or the root when it does not exist.
    pub async fn select_by_fs_path(&self, fs_path: &str) -> Result<TreeItem> {
        let found = find_item_from_fs_path(&self.tree(), fs_path).cloned();
        match found {
            None => {
                self.select_root();
                Ok(self.root_item())
            }
            Some(item) if self.is_current(&item) => Ok(item),
            Some(item) => self.select(item).await,
        }
    }

    /// Select the directory containing `fs_path`, or the root.
    pub async fn select_parent(&self, fs_path: &str) -> Result<TreeItem> {
        let parent = find_parent_from_fs_path(&self.tree(), fs_path).cloned();
        match parent {
            Some(parent) => self.select(parent).await,
            None => {
                self.select_root();
                Ok(self.root_item())
            }
        }
    }

    /// Select the node served at `route`. Unknown or already selected routes
    /// leave the selection alone.
    pub async fn select_by_route(&self, route: &str) -> Result<Option<TreeItem>> {
        let found = find_item_from_route(&self.tree(), route).cloned();
        match found {
            Some(item) if !self.is_current(&item) => self.select(item).await.map(Some),
            _ => Ok(None),
        }
    }

    async fn select(&self, item: TreeItem) -> Result<TreeItem> {
        if item.is_file() {
            self.draft.select_by_fs_path(&item.fs_path).await?;
        } else {
            self.draft.unselect();
        }
        *self.current_fs_path.write() = Some(item.fs_path.clone());
        Ok(item)
    }

    fn select_root(&self) {
        *self.current_fs_path.write() = None;
        self.draft.unselect();
    }

    fn is_current(&self, item: &TreeItem) -> bool {
        self.current_fs_path.read().as_deref() == Some(item.fs_path.as_str())
    }
}

#[async_trait]
impl<T: StudioItem> EventHandler for TreeState<T> {
    async fn handle(&self, event: &StudioEvent) {
        if event.kind != T::KIND {
            return;
        }

        tracing::debug!("[tree] {} called by {}", event.name(), event.caller);
        if let Err(e) = self.rebuild(event.caller != LOAD_CALLER).await {
            tracing::error!("[tree] Failed to rebuild {} tree: {}", T::KIND.label(), e);
        }
    }
}
