//! Draft lifecycle management.
//!
//! A [`DraftStore`] owns the staged changes of one item kind. Documents and
//! media share the generic store and add their own operations in
//! [`documents`] and [`media`].

pub mod conflict;
pub mod documents;
pub mod locks;
pub mod media;
pub mod status;
pub mod store;


use serde::{Deserialize, Serialize};

pub use conflict::ConflictDetector;
pub use locks::KeyedLocks;
pub use status::{derive_status, find_descendant_ids, is_same_or_descendant};
pub use store::DraftStore;

/// Move the item `id` to `new_fs_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub id: String,
    pub new_fs_path: String,
}

impl RenameRequest {
    pub fn new(id: impl Into<String>, new_fs_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            new_fs_path: new_fs_path.into(),
        }
    }
}
