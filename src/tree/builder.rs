//! Navigation tree construction.
//!
//! The tree is derived from the database listing plus the draft list and is
//! rebuilt wholesale on every change. Deleted drafts no longer have a
//! database item, so they are injected as virtual items to stay visible.

use crate::models::{
    split_numeric_prefix, DraftItem, DraftStatus, StudioItem, TreeItem, TreeItemType, TreeStatus,
};

/// A file to place in the tree.
struct Source {
    fs_path: String,
    route_path: Option<String>,
}

/// Build the tree for `items`, overlaying the status of `drafts`.
pub fn build_tree<T: StudioItem>(items: &[T], drafts: &[DraftItem<T>]) -> Vec<TreeItem> {
    let mut sources: Vec<Source> = items
        .iter()
        .map(|item| Source {
            fs_path: item.fs_path(),
            route_path: item.route_path().map(str::to_string),
        })
        .collect();
    sources.extend(virtual_deleted_items(drafts));

    let mut tree: Vec<TreeItem> = Vec::new();

    for source in &sources {
        let segments: Vec<&str> = source.fs_path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((file_segment, dir_segments)) = segments.split_last() else {
            continue;
        };

        let file = file_node(source, file_segment, dir_segments.is_empty(), drafts);

        let mut children = &mut tree;
        for depth in 0..dir_segments.len() {
            let dir_fs_path = dir_segments[..=depth].join("/");
            let current = children;
            let index = match current
                .iter()
                .position(|c| c.is_directory() && c.fs_path == dir_fs_path)
            {
                Some(index) => index,
                None => {
                    current.push(directory_node(dir_segments[depth], dir_fs_path));
                    current.len() - 1
                }
            };
            children = current[index].children.get_or_insert_with(Vec::new);
        }
        children.push(file);
    }

    propagate_statuses(&mut tree);
    tree
}

/// Tree status of a draft. A created draft whose original has another id is
/// a rename.
pub fn tree_status<T: StudioItem>(draft: &DraftItem<T>) -> TreeStatus {
    match draft.status {
        DraftStatus::Created if draft.is_rename() => TreeStatus::Renamed,
        status => status.into(),
    }
}

/// Deleted drafts, minus those a created draft was renamed from.
fn virtual_deleted_items<T: StudioItem>(drafts: &[DraftItem<T>]) -> Vec<Source> {
    drafts
        .iter()
        .filter(|d| d.status == DraftStatus::Deleted)
        .filter(|deleted| {
            !drafts.iter().any(|d| {
                d.status == DraftStatus::Created
                    && d
                        .original
                        .as_ref()
                        .is_some_and(|o| o.fs_path() == deleted.fs_path)
            })
        })
        .map(|d| Source {
            fs_path: d.fs_path.clone(),
            route_path: d
                .original
                .as_ref()
                .and_then(|o| o.route_path())
                .map(str::to_string),
        })
        .collect()
}

fn file_node<T: StudioItem>(
    source: &Source,
    file_segment: &str,
    at_root: bool,
    drafts: &[DraftItem<T>],
) -> TreeItem {
    let (prefix, name) = split_numeric_prefix(strip_extension(file_segment));
    let name = if at_root && name == "index" { "home" } else { name };

    TreeItem {
        name: name.to_string(),
        fs_path: source.fs_path.clone(),
        item_type: TreeItemType::File,
        status: drafts
            .iter()
            .find(|d| d.fs_path == source.fs_path)
            .map(tree_status),
        prefix: prefix.map(str::to_string),
        route_path: source.route_path.clone().filter(|p| !p.is_empty()),
        hidden: source.fs_path.ends_with(".gitkeep"),
        children: None,
    }
}

fn directory_node(segment: &str, fs_path: String) -> TreeItem {
    let (prefix, name) = split_numeric_prefix(segment);
    TreeItem {
        name: name.to_string(),
        fs_path,
        item_type: TreeItemType::Directory,
        status: None,
        prefix: prefix.map(str::to_string),
        route_path: None,
        hidden: false,
        children: Some(Vec::new()),
    }
}

/// `name.ext` → `name`. A dotfile loses its whole name.
fn strip_extension(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(idx) if idx + 1 < segment.len() => &segment[..idx],
        _ => segment,
    }
}

/// Post-order: a directory is Updated when a direct child carries a change,
/// or takes the children's common status when all of them are Deleted,
/// Renamed or Created.
fn propagate_statuses(items: &mut [TreeItem]) {
    for item in items.iter_mut() {
        if item.is_file() {
            continue;
        }
        let Some(children) = item.children.as_mut() else {
            continue;
        };
        propagate_statuses(children);

        let changed: Vec<TreeStatus> = children
            .iter()
            .filter_map(|c| c.status)
            .filter(|s| *s != TreeStatus::Opened)
            .collect();
        if changed.is_empty() {
            continue;
        }

        let mut status = TreeStatus::Updated;
        if changed.len() == children.len() {
            for shared in [TreeStatus::Deleted, TreeStatus::Renamed, TreeStatus::Created] {
                if changed.iter().all(|s| *s == shared) {
                    status = shared;
                    break;
                }
            }
        }
        item.status = Some(status);
    }
}
