//! Shared data model: items, drafts and tree nodes.

pub mod draft;
pub mod item;
pub mod tree;

pub use draft::{Conflict, DraftItem, DraftStatus, FileEncoding, RawFile};
pub use item::{
    file_extension, fs_path_from_id, route_from_stem, split_numeric_prefix, stem_from_fs_path,
    strip_data_url_header, DocumentItem, ItemKind, MediaItem, StudioItem, MEDIA_COLLECTION,
};
pub use tree::{TreeItem, TreeItemType, TreeStatus};
