//! Navigation tree: construction, lookups and per-kind view state.

pub mod builder;
pub mod lookup;
pub mod state;

pub use builder::{build_tree, tree_status};
pub use lookup::{
    find_descendant_file_items_from_fs_path, find_item_from_fs_path, find_item_from_route,
    find_parent_from_fs_path,
};
pub use state::TreeState;
