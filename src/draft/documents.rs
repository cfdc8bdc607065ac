//! Document-only draft operations.

use super::store::DraftStore;
use super::RenameRequest;
use crate::error::{Result, StudioError};
use crate::models::{DocumentItem, DraftItem, DraftStatus, FileEncoding, ItemKind, RawFile, StudioItem};
use crate::repository::join_path;

impl DraftStore<DocumentItem> {
    /// Move documents to new paths.
    ///
    /// The old id is removed and the content re-created at the new id with
    /// the old baseline as its original, which the tree shows as a rename.
    pub async fn rename(&self, requests: &[RenameRequest]) -> Result<Vec<DraftItem<DocumentItem>>> {
        let mut renamed = Vec::with_capacity(requests.len());
        let mut outcome = Ok(());

        for request in requests {
            match self.rename_one(request).await {
                Ok(draft) => renamed.push(draft),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        // earlier requests are already applied
        if !renamed.is_empty() {
            self.publish("DraftStore.rename").await;
        }
        outcome.map(|_| renamed)
    }

    async fn rename_one(&self, request: &RenameRequest) -> Result<DraftItem<DocumentItem>> {
        let (document, original) = {
            let _guard = self.locks().lock(&request.id).await;
            let plan = self.plan_rename(request).await?;

            let content = self.render(&plan.current).await?;
            let document = self.parse(&plan.new_id, &content).await?;

            self.remove_one(&request.id).await?;
            (document, plan.original)
        };

        let _guard = self.locks().lock(document.id()).await;
        tracing::debug!("[draft] Renaming {} to {}", request.id, document.id);
        self.create_inner(document, original).await
    }

    /// Stage a copy of a document next to it as `<name>-copy.<ext>`.
    pub async fn duplicate(&self, id: &str) -> Result<DraftItem<DocumentItem>> {
        let source = match self.get(id).and_then(|d| d.modified) {
            Some(modified) => modified,
            None => self
                .database()
                .get(id)
                .await?
                .ok_or_else(|| StudioError::NoCorrespondingEntry(id.to_string()))?,
        };

        let fs_path = source.fs_path();
        let copy_path = copy_fs_path(&fs_path);
        let new_id = match source.id.strip_suffix(fs_path.as_str()) {
            Some(collection) if !collection.is_empty() => format!("{}{}", collection, copy_path),
            _ => self.database().id_from_fs_path(&copy_path),
        };

        let content = self.render(&source).await?;
        let document = self.parse(&new_id, &content).await?;
        self.create(document, None).await
    }

    /// Every draft serialized for commit under `content/`.
    pub async fn list_as_raw_files(&self) -> Result<Vec<RawFile>> {
        let drafts = self.list();
        let mut files = Vec::with_capacity(drafts.len());

        for draft in drafts.iter() {
            let content = match (&draft.status, &draft.modified) {
                (DraftStatus::Deleted, _) | (_, None) => None,
                (_, Some(modified)) => self.converter().content_from_document(modified).await?,
            };
            files.push(RawFile {
                path: join_path(&[ItemKind::Document.remote_dir(), &draft.fs_path]),
                content,
                status: draft.status,
                encoding: FileEncoding::Utf8,
            });
        }
        Ok(files)
    }

    async fn render(&self, document: &DocumentItem) -> Result<String> {
        self.converter()
            .content_from_document(document)
            .await?
            .ok_or_else(|| {
                StudioError::Content(format!("Unsupported document format: {}", document.id))
            })
    }

    async fn parse(&self, id: &str, content: &str) -> Result<DocumentItem> {
        self.converter()
            .document_from_content(id, content)
            .await?
            .ok_or_else(|| StudioError::Content(format!("Unsupported document format: {}", id)))
    }
}

/// `dir/name.ext` → `dir/name-copy.ext`
pub(crate) fn copy_fs_path(fs_path: &str) -> String {
    let (dir, file) = match fs_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, fs_path),
    };

    let name = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-copy.{}", stem, ext),
        _ => format!("{}-copy", file),
    };

    match dir {
        Some(dir) if !dir.is_empty() => format!("{}/{}", dir, name),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_fs_path() {
        assert_eq!(copy_fs_path("guide/intro.md"), "guide/intro-copy.md");
        assert_eq!(copy_fs_path("index.md"), "index-copy.md");
        assert_eq!(copy_fs_path("notes/README"), "notes/README-copy");
        assert_eq!(copy_fs_path("a/b/1.setup.md"), "a/b/1.setup-copy.md");
    }
}
