//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or, with `--json`, one
//! JSON document on stdout. Diagnostics go to stderr.

use serde::Serialize;
use similar::TextDiff;

use crate::models::{DraftItem, StudioItem, TreeItem};
use crate::repository::CommitResult;

/// One line of `status` output in JSON mode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub id: String,
    pub fs_path: String,
    pub status: String,
    pub conflict: bool,
}

impl<T: StudioItem> From<&DraftItem<T>> for DraftSummary {
    fn from(draft: &DraftItem<T>) -> Self {
        Self {
            id: draft.id.clone(),
            fs_path: draft.fs_path.clone(),
            status: draft.status.to_string(),
            conflict: draft.conflict.is_some(),
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<S: Serialize>(value: &S) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a tree with one node per line, indented by depth.
pub fn format_tree(items: &[TreeItem]) -> String {
    let mut out = String::new();
    write_tree(items, 0, &mut out);
    out
}

fn write_tree(items: &[TreeItem], depth: usize, out: &mut String) {
    for item in items {
        let marker = if item.is_directory() { "/" } else { "" };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&item.name);
        out.push_str(marker);
        if let Some(status) = item.status {
            out.push_str(&format!(" [{}]", status));
        }
        out.push('\n');
        write_tree(item.children(), depth + 1, out);
    }
}

/// Print the tree of one item kind under a heading.
pub fn print_tree(label: &str, items: &[TreeItem]) {
    println!("{}:", label);
    if items.is_empty() {
        println!("  (empty)");
        return;
    }
    for line in format_tree(items).lines() {
        println!("  {}", line);
    }
}

/// Print pending drafts with their status and conflict marker.
pub fn print_drafts(drafts: &[DraftSummary]) {
    if drafts.is_empty() {
        println!("No pending drafts.");
        return;
    }
    for draft in drafts {
        let conflict = if draft.conflict { " (conflict)" } else { "" };
        println!("{:>8}  {}{}", draft.status, draft.fs_path, conflict);
    }
}

/// Unified diff of one file, with `a/` and `b/` headers.
pub fn unified_diff(path: &str, before: &str, after: &str) -> String {
    let diff = TextDiff::from_lines(before, after);
    diff.unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", path), &format!("b/{}", path))
        .to_string()
}

pub fn print_commit(result: Option<&CommitResult>, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&result);
    }
    match result {
        Some(commit) => println!("Committed {} ({})", truncate(&commit.commit_sha, 7), commit.url),
        None => println!("Nothing committed."),
    }
    Ok(())
}

/// Truncate a string to a maximum length (character-safe).
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TreeItemType, TreeStatus};

    fn node(name: &str, item_type: TreeItemType, status: Option<TreeStatus>) -> TreeItem {
        TreeItem {
            name: name.to_string(),
            fs_path: name.to_string(),
            item_type,
            status,
            prefix: None,
            route_path: None,
            hidden: false,
            children: None,
        }
    }

    #[test]
    fn test_format_tree_indents_children() {
        let mut dir = node("guide", TreeItemType::Directory, Some(TreeStatus::Updated));
        dir.children = Some(vec![node(
            "intro",
            TreeItemType::File,
            Some(TreeStatus::Updated),
        )]);
        let items = vec![node("index", TreeItemType::File, None), dir];

        assert_eq!(
            format_tree(&items),
            "index\nguide/ [updated]\n  intro [updated]\n"
        );
    }

    #[test]
    fn test_unified_diff_headers() {
        let diff = unified_diff("content/a.md", "one\ntwo\n", "one\nthree\n");
        assert!(diff.contains("--- a/content/a.md"));
        assert!(diff.contains("+++ b/content/a.md"));
        assert!(diff.contains("-two"));
        assert!(diff.contains("+three"));
    }

    #[test]
    fn test_unified_diff_identical_is_empty() {
        assert!(unified_diff("a.md", "same\n", "same\n").is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc123def", 7), "abc123d");
        assert_eq!(truncate("short", 7), "short");
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
