use std::sync::Arc;

use crate::draft::DraftStore;
use crate::error::Result;
use crate::events::{EventBus, EventHandler, SubscriptionId};
use crate::host::{ContentConverter, Database, DraftStorage};
use crate::models::{DocumentItem, DraftStatus, MediaItem, RawFile};
use crate::repository::{create_provider, CommitResult, RepositoryClient, RepositoryConfig};
use crate::settings::StudioSettings;
use crate::tree::TreeState;

/// Collaborators supplied by the embedding application.
pub struct HostServices {
    pub document_db: Arc<dyn Database<DocumentItem>>,
    pub media_db: Arc<dyn Database<MediaItem>>,
    pub document_storage: Arc<dyn DraftStorage>,
    pub media_storage: Arc<dyn DraftStorage>,
    pub converter: Arc<dyn ContentConverter>,
}

/// Every service of one editing session, wired once and shared by `Arc`.
pub struct StudioSession {
    pub bus: Arc<EventBus>,
    pub repository: Arc<dyn RepositoryClient>,
    pub documents: Arc<DraftStore<DocumentItem>>,
    pub medias: Arc<DraftStore<MediaItem>>,
    pub document_tree: Arc<TreeState<DocumentItem>>,
    pub media_tree: Arc<TreeState<MediaItem>>,
    subscriptions: Vec<SubscriptionId>,
}

impl StudioSession {
    /// Build a session against the repository configured in `settings`.
    pub fn start(settings: &StudioSettings, host: HostServices) -> Result<Self> {
        let repository = create_provider(RepositoryConfig::from_settings(settings))?;
        Ok(Self::with_repository(repository, host))
    }

    pub fn with_repository(repository: Arc<dyn RepositoryClient>, host: HostServices) -> Self {
        let bus = Arc::new(EventBus::new());

        let documents = Arc::new(DraftStore::new(
            host.document_db,
            host.document_storage,
            repository.clone(),
            host.converter.clone(),
            bus.clone(),
        ));
        let medias = Arc::new(DraftStore::new(
            host.media_db,
            host.media_storage,
            repository.clone(),
            host.converter,
            bus.clone(),
        ));

        let document_tree = Arc::new(TreeState::new(documents.clone()));
        let media_tree = Arc::new(TreeState::new(medias.clone()));

        let document_handler: Arc<dyn EventHandler> = document_tree.clone();
        let media_handler: Arc<dyn EventHandler> = media_tree.clone();
        let subscriptions = vec![bus.register(&document_handler), bus.register(&media_handler)];

        let info = repository.repository_info();
        tracing::info!(
            "[draft] Session started for {}/{}@{} ({})",
            info.owner,
            info.repo,
            info.branch,
            info.provider
        );

        Self {
            bus,
            repository,
            documents,
            medias,
            document_tree,
            media_tree,
            subscriptions,
        }
    }

    /// Restore persisted drafts of both kinds and build both trees.
    pub async fn load(&self) -> Result<()> {
        self.documents.load().await?;
        self.medias.load().await?;
        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        !self.documents.pending().is_empty() || !self.medias.pending().is_empty()
    }

    /// All drafts of both kinds, serialized for commit.
    pub async fn raw_files(&self) -> Result<Vec<RawFile>> {
        let mut files = self.documents.list_as_raw_files().await?;
        files.extend(self.medias.list_as_raw_files());
        Ok(files)
    }

    /// Commit every pending draft as one commit, then forget the drafts.
    ///
    /// Returns `Ok(None)` when there was nothing to commit or no write token.
    pub async fn commit(&self, message: &str) -> Result<Option<CommitResult>> {
        let files: Vec<RawFile> = self
            .raw_files()
            .await?
            .into_iter()
            .filter(|f| f.status != DraftStatus::Pristine)
            .collect();
        if files.is_empty() {
            tracing::info!("[git] No pending drafts to commit");
            return Ok(None);
        }

        let result = self.repository.commit_files(&files, message).await?;
        if let Some(commit) = &result {
            tracing::info!("[git] Committed {} file(s): {}", files.len(), commit.url);
            self.documents.clear().await?;
            self.medias.clear().await?;
        }
        Ok(result)
    }

    /// Detach the trees from the event bus.
    pub fn end(&self) {
        for id in &self.subscriptions {
            self.bus.unregister(*id);
        }
        tracing::debug!("[events] Session subscriptions released");
    }
}
