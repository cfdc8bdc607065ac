//! Searches over a built tree.

use crate::models::TreeItem;

/// Depth-first search for the node at `fs_path`.
pub fn find_item_from_fs_path<'a>(tree: &'a [TreeItem], fs_path: &str) -> Option<&'a TreeItem> {
    for item in tree {
        if item.fs_path == fs_path {
            return Some(item);
        }
        if let Some(found) = find_item_from_fs_path(item.children(), fs_path) {
            return Some(found);
        }
    }
    None
}

/// The directory directly containing `fs_path`. Root-level nodes have none.
pub fn find_parent_from_fs_path<'a>(tree: &'a [TreeItem], fs_path: &str) -> Option<&'a TreeItem> {
    for item in tree {
        let children = item.children();
        if children.iter().any(|child| child.fs_path == fs_path) {
            return Some(item);
        }
        if let Some(found) = find_parent_from_fs_path(children, fs_path) {
            return Some(found);
        }
    }
    None
}

/// The node whose route is `route`, searching only inside directories.
pub fn find_item_from_route<'a>(tree: &'a [TreeItem], route: &str) -> Option<&'a TreeItem> {
    for item in tree {
        if item.route_path.as_deref() == Some(route) {
            return Some(item);
        }
        if item.is_directory() {
            if let Some(found) = find_item_from_route(item.children(), route) {
                return Some(found);
            }
        }
    }
    None
}

/// Every file at or below `fs_path`.
pub fn find_descendant_file_items_from_fs_path<'a>(
    tree: &'a [TreeItem],
    fs_path: &str,
) -> Vec<&'a TreeItem> {
    let mut found = Vec::new();
    let below = format!("{}/", fs_path);
    collect_matching(tree, fs_path, &below, &mut found);
    found
}

fn collect_matching<'a>(
    items: &'a [TreeItem],
    fs_path: &str,
    below: &str,
    found: &mut Vec<&'a TreeItem>,
) {
    for item in items {
        if item.is_file() {
            if item.fs_path == fs_path || item.fs_path.starts_with(below) {
                found.push(item);
            }
        } else if item.fs_path == fs_path {
            collect_files(item.children(), found);
        } else {
            collect_matching(item.children(), fs_path, below, found);
        }
    }
}

fn collect_files<'a>(items: &'a [TreeItem], found: &mut Vec<&'a TreeItem>) {
    for item in items {
        if item.is_file() {
            found.push(item);
        }
        collect_files(item.children(), found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TreeItemType, TreeStatus};

    fn file(fs_path: &str, route: &str) -> TreeItem {
        TreeItem {
            name: fs_path.rsplit('/').next().unwrap_or(fs_path).to_string(),
            fs_path: fs_path.to_string(),
            item_type: TreeItemType::File,
            status: None,
            prefix: None,
            route_path: Some(route.to_string()),
            hidden: false,
            children: None,
        }
    }

    fn dir(fs_path: &str, children: Vec<TreeItem>) -> TreeItem {
        TreeItem {
            name: fs_path.rsplit('/').next().unwrap_or(fs_path).to_string(),
            fs_path: fs_path.to_string(),
            item_type: TreeItemType::Directory,
            status: Some(TreeStatus::Updated),
            prefix: None,
            route_path: None,
            hidden: false,
            children: Some(children),
        }
    }

    fn tree() -> Vec<TreeItem> {
        vec![
            file("index.md", "/"),
            dir(
                "guide",
                vec![
                    file("guide/intro.md", "/guide/intro"),
                    dir("guide/advanced", vec![file("guide/advanced/deep.md", "/guide/advanced/deep")]),
                ],
            ),
        ]
    }

    #[test]
    fn test_find_item_from_fs_path() {
        let tree = tree();
        assert_eq!(
            find_item_from_fs_path(&tree, "guide/advanced/deep.md").map(|i| i.name.as_str()),
            Some("deep.md")
        );
        assert_eq!(
            find_item_from_fs_path(&tree, "guide/advanced").map(|i| i.item_type),
            Some(TreeItemType::Directory)
        );
        assert!(find_item_from_fs_path(&tree, "missing.md").is_none());
    }

    #[test]
    fn test_find_parent_from_fs_path() {
        let tree = tree();
        assert_eq!(
            find_parent_from_fs_path(&tree, "guide/advanced/deep.md").map(|i| i.fs_path.as_str()),
            Some("guide/advanced")
        );
        assert_eq!(
            find_parent_from_fs_path(&tree, "guide/intro.md").map(|i| i.fs_path.as_str()),
            Some("guide")
        );
        assert!(find_parent_from_fs_path(&tree, "index.md").is_none());
    }

    #[test]
    fn test_find_item_from_route() {
        let tree = tree();
        assert_eq!(
            find_item_from_route(&tree, "/guide/advanced/deep").map(|i| i.fs_path.as_str()),
            Some("guide/advanced/deep.md")
        );
        assert_eq!(
            find_item_from_route(&tree, "/").map(|i| i.fs_path.as_str()),
            Some("index.md")
        );
        assert!(find_item_from_route(&tree, "/nope").is_none());
    }

    #[test]
    fn test_find_descendant_file_items() {
        let tree = tree();
        let paths = |items: Vec<&TreeItem>| -> Vec<String> {
            items.into_iter().map(|i| i.fs_path.clone()).collect()
        };

        assert_eq!(
            paths(find_descendant_file_items_from_fs_path(&tree, "guide")),
            vec!["guide/intro.md", "guide/advanced/deep.md"]
        );
        assert_eq!(
            paths(find_descendant_file_items_from_fs_path(&tree, "index.md")),
            vec!["index.md"]
        );
        assert!(find_descendant_file_items_from_fs_path(&tree, "gui").is_empty());
    }
}
