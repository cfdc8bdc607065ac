//! Detection of drafts whose remote file moved on.

use std::sync::Arc;

use crate::compare::matches_raw_content;
use crate::host::ContentConverter;
use crate::models::{Conflict, DocumentItem, DraftItem, DraftStatus, ItemKind, StudioItem};

/// Compares a draft's baseline against the remote file it was fetched with.
pub struct ConflictDetector {
    converter: Arc<dyn ContentConverter>,
}

impl ConflictDetector {
    pub fn new(converter: Arc<dyn ContentConverter>) -> Self {
        Self { converter }
    }

    /// Conflict between `draft` and its remote file, if any.
    ///
    /// Media, `.gitkeep` placeholders and deletions are never in conflict.
    /// Converter failures are logged and treated as no conflict.
    pub async fn check<T: StudioItem>(&self, draft: &DraftItem<T>) -> Option<Conflict> {
        if T::KIND == ItemKind::Media
            || draft.fs_path.ends_with(".gitkeep")
            || draft.status == DraftStatus::Deleted
        {
            return None;
        }

        let remote = draft.remote_file.as_ref()?;
        let remote_content = remote.decoded_content()?;

        if draft.status == DraftStatus::Created {
            // the file is new locally but already exists remotely
            let modified = draft.modified.as_ref()?.as_document()?;
            let local_content = self.render(modified).await?;
            tracing::warn!("[draft] Conflict on {}: file already exists remotely", draft.id);
            return Some(Conflict {
                remote_content,
                local_content,
            });
        }

        let original = draft.original.as_ref()?.as_document()?;
        match matches_raw_content(self.converter.as_ref(), &remote_content, original).await {
            Ok(true) => None,
            Ok(false) => {
                let local_content = self.render(original).await?;
                if local_content.trim() == remote_content.trim() {
                    return None;
                }
                tracing::warn!("[draft] Conflict on {}: remote content changed", draft.id);
                Some(Conflict {
                    remote_content,
                    local_content,
                })
            }
            Err(e) => {
                tracing::warn!("[draft] Conflict check failed for {}: {}", draft.id, e);
                None
            }
        }
    }

    pub fn converter(&self) -> &Arc<dyn ContentConverter> {
        &self.converter
    }

    async fn render(&self, document: &DocumentItem) -> Option<String> {
        match self.converter.content_from_document(document).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("[draft] Failed to render {}: {}", document.id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BasicConverter;
    use crate::models::MediaItem;
    use crate::repository::{RemoteFile, RepositoryProvider};
    use base64::Engine;

    const CONTENT: &str = "---\ntitle: A\n---\n\nHello\n";

    fn remote(content: &str) -> RemoteFile {
        RemoteFile {
            name: "a.md".to_string(),
            path: "content/a.md".to_string(),
            sha: "sha".to_string(),
            size: content.len() as u64,
            url: None,
            content: Some(base64::engine::general_purpose::STANDARD.encode(content)),
            encoding: "base64".to_string(),
            provider: RepositoryProvider::GitHub,
        }
    }

    async fn parsed(content: &str) -> DocumentItem {
        BasicConverter
            .document_from_content("docs/a.md", content)
            .await
            .unwrap()
            .unwrap()
    }

    fn draft(
        status: DraftStatus,
        original: Option<DocumentItem>,
        modified: Option<DocumentItem>,
        remote_file: Option<RemoteFile>,
    ) -> DraftItem<DocumentItem> {
        DraftItem {
            id: "docs/a.md".to_string(),
            fs_path: "a.md".to_string(),
            status,
            original,
            modified,
            remote_file,
            conflict: None,
        }
    }

    fn detector() -> ConflictDetector {
        ConflictDetector::new(Arc::new(BasicConverter))
    }

    #[tokio::test]
    async fn test_matching_remote_is_not_a_conflict() {
        let doc = parsed(CONTENT).await;
        let d = draft(
            DraftStatus::Pristine,
            Some(doc.clone()),
            Some(doc),
            Some(remote(CONTENT)),
        );
        assert!(detector().check(&d).await.is_none());
    }

    #[tokio::test]
    async fn test_changed_remote_is_a_conflict() {
        let doc = parsed(CONTENT).await;
        let d = draft(
            DraftStatus::Updated,
            Some(doc.clone()),
            Some(doc),
            Some(remote("---\ntitle: A\n---\n\nChanged upstream\n")),
        );

        let conflict = detector().check(&d).await.unwrap();
        assert!(conflict.remote_content.contains("Changed upstream"));
        assert!(conflict.local_content.contains("Hello"));
    }

    #[tokio::test]
    async fn test_created_with_existing_remote_is_a_conflict() {
        let doc = parsed(CONTENT).await;
        let d = draft(DraftStatus::Created, None, Some(doc), Some(remote(CONTENT)));
        assert!(detector().check(&d).await.is_some());
    }

    #[tokio::test]
    async fn test_skipped_cases() {
        let doc = parsed(CONTENT).await;
        let changed = remote("Other\n");

        let no_remote = draft(DraftStatus::Updated, Some(doc.clone()), Some(doc.clone()), None);
        assert!(detector().check(&no_remote).await.is_none());

        let deleted = draft(DraftStatus::Deleted, Some(doc.clone()), None, Some(changed.clone()));
        assert!(detector().check(&deleted).await.is_none());

        let mut gitkeep = draft(DraftStatus::Updated, Some(doc.clone()), Some(doc), Some(changed.clone()));
        gitkeep.fs_path = "dir/.gitkeep".to_string();
        assert!(detector().check(&gitkeep).await.is_none());

        let media = MediaItem::from_bytes("a.png", b"x", "image/png");
        let media_draft = DraftItem {
            id: media.id.clone(),
            fs_path: "a.png".to_string(),
            status: DraftStatus::Updated,
            original: Some(media.clone()),
            modified: Some(media),
            remote_file: Some(changed),
            conflict: None,
        };
        assert!(detector().check(&media_draft).await.is_none());
    }
}
