//! Media-only draft operations.

use super::store::DraftStore;
use super::RenameRequest;
use crate::error::Result;
use crate::models::{
    file_extension, stem_from_fs_path, DraftItem, DraftStatus, FileEncoding, ItemKind, MediaItem,
    RawFile,
};
use crate::repository::join_path;

impl DraftStore<MediaItem> {
    /// Stage a new media file under `parent_fs_path` (`/` for the root).
    pub async fn upload(
        &self,
        parent_fs_path: &str,
        file_name: &str,
        bytes: &[u8],
        mime: &str,
    ) -> Result<DraftItem<MediaItem>> {
        let fs_path = join_path(&[parent_fs_path, file_name]);
        tracing::debug!("[draft] Uploading {} ({} bytes)", fs_path, bytes.len());
        let item = MediaItem::from_bytes(&fs_path, bytes, mime);
        self.create(item, None).await
    }

    /// Move media files to new paths, keeping their data.
    pub async fn rename(&self, requests: &[RenameRequest]) -> Result<Vec<DraftItem<MediaItem>>> {
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

        if !renamed.is_empty() {
            self.publish("DraftStore.rename").await;
        }
        outcome.map(|_| renamed)
    }

    async fn rename_one(&self, request: &RenameRequest) -> Result<DraftItem<MediaItem>> {
        let (item, original) = {
            let _guard = self.locks().lock(&request.id).await;
            let plan = self.plan_rename(request).await?;
            let item = moved(plan.current, plan.new_id, &request.new_fs_path);
            self.remove_one(&request.id).await?;
            (item, plan.original)
        };

        let _guard = self.locks().lock(&item.id).await;
        tracing::debug!("[draft] Renaming {} to {}", request.id, item.id);
        self.create_inner(item, original).await
    }

    /// Every draft serialized for commit under `public/`.
    pub fn list_as_raw_files(&self) -> Vec<RawFile> {
        self.list()
            .iter()
            .map(|draft| {
                let content = match draft.status {
                    DraftStatus::Deleted => None,
                    _ => draft
                        .modified
                        .as_ref()
                        .and_then(|m| m.base64_payload())
                        .map(str::to_string),
                };
                RawFile {
                    path: join_path(&[ItemKind::Media.remote_dir(), &draft.fs_path]),
                    content,
                    status: draft.status,
                    encoding: FileEncoding::Base64,
                }
            })
            .collect()
    }
}

fn moved(item: MediaItem, new_id: String, new_fs_path: &str) -> MediaItem {
    let fs_path = new_fs_path.trim_start_matches('/').to_string();
    MediaItem {
        id: new_id,
        extension: file_extension(&fs_path).to_string(),
        stem: stem_from_fs_path(&fs_path),
        path: Some(format!("/{}", fs_path)),
        fs_path: Some(fs_path),
        ..item
    }
}
