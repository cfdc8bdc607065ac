//! Navigation tree nodes.

use serde::{Deserialize, Serialize};

use super::draft::DraftStatus;

/// Status shown on a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeStatus {
    Opened,
    Created,
    Updated,
    Deleted,
    Renamed,
}

impl From<DraftStatus> for TreeStatus {
    fn from(status: DraftStatus) -> Self {
        match status {
            DraftStatus::Pristine => TreeStatus::Opened,
            DraftStatus::Created => TreeStatus::Created,
            DraftStatus::Updated => TreeStatus::Updated,
            DraftStatus::Deleted => TreeStatus::Deleted,
        }
    }
}

impl std::fmt::Display for TreeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TreeStatus::Opened => "opened",
            TreeStatus::Created => "created",
            TreeStatus::Updated => "updated",
            TreeStatus::Deleted => "deleted",
            TreeStatus::Renamed => "renamed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeItemType {
    File,
    Directory,
    Root,
}

/// One node of the navigation tree. Rebuilt wholesale on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    pub name: String,
    pub fs_path: String,

    #[serde(rename = "type")]
    pub item_type: TreeItemType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TreeStatus>,

    /// Numeric ordering prefix stripped from the name (`1.guide` → `1`).
    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_path: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeItem>>,
}

impl TreeItem {
    pub fn is_file(&self) -> bool {
        self.item_type == TreeItemType::File
    }

    pub fn is_directory(&self) -> bool {
        self.item_type == TreeItemType::Directory
    }

    pub fn children(&self) -> &[TreeItem] {
        self.children.as_deref().unwrap_or(&[])
    }
}
