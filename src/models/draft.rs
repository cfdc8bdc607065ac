//! Draft types: a staged change to one item.

use serde::{Deserialize, Serialize};

use crate::repository::RemoteFile;

/// Status of a staged change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    /// Opened but unchanged.
    #[serde(rename = "opened", alias = "pristine")]
    Pristine,
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DraftStatus::Pristine => "opened",
            DraftStatus::Created => "created",
            DraftStatus::Updated => "updated",
            DraftStatus::Deleted => "deleted",
        };
        write!(f, "{}", s)
    }
}

/// Remote and local renderings of a diverged draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub remote_content: String,
    pub local_content: String,
}

/// A staged change to one item.
///
/// `original` is the database state the draft was opened from (absent for
/// brand-new items). `modified` is the staged payload (absent once deleted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "T: crate::models::StudioItem")]
pub struct DraftItem<T> {
    pub id: String,
    pub fs_path: String,
    pub status: DraftStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_file: Option<RemoteFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<Conflict>,
}

impl<T: crate::models::StudioItem> DraftItem<T> {
    /// A Created draft whose original carries another id is a rename.
    pub fn is_rename(&self) -> bool {
        match (&self.original, &self.modified) {
            (Some(original), Some(modified)) => original.id() != modified.id(),
            _ => false,
        }
    }
}

/// Character encoding of a [`RawFile`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

/// A draft serialized for commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFile {
    /// Repository path relative to the root dir, e.g. `content/docs/a.md`.
    pub path: String,

    /// `None` for deletions.
    pub content: Option<String>,

    pub status: DraftStatus,

    pub encoding: FileEncoding,
}
