//! File-tree projection of a flat changed-path list.

use std::collections::HashSet;

use super::assemble::FileEntry;
use super::repo::ChangeKind;

/// A directory or file in the sidebar tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Last path segment.
    pub name: String,
    /// Full repository-relative path.
    pub path: String,
    /// Interior node.
    pub is_directory: bool,
    /// Children are shown (directories only).
    pub is_expanded: bool,
    /// Directories first, then files; each group by name.
    pub children: Vec<TreeNode>,
    /// For directories, derived from descendants.
    pub change_kind: ChangeKind,
    /// Sum over descendants for directories.
    pub lines_added: usize,
    /// Sum over descendants for directories.
    pub lines_removed: usize,
    /// Nesting level, 0 at the root.
    pub depth: usize,
}

impl TreeNode {
    fn directory(name: &str, path: String, depth: usize) -> Self {
        Self {
            name: name.to_string(),
            path,
            is_directory: true,
            is_expanded: true,
            children: Vec::new(),
            change_kind: ChangeKind::Modified,
            lines_added: 0,
            lines_removed: 0,
            depth,
        }
    }

    fn file(name: &str, entry: &FileEntry, depth: usize) -> Self {
        Self {
            name: name.to_string(),
            path: entry.path.as_str().to_string(),
            is_directory: false,
            is_expanded: false,
            children: Vec::new(),
            change_kind: entry.change_kind,
            lines_added: entry.lines_added,
            lines_removed: entry.lines_removed,
            depth,
        }
    }

    /// Paths of every file at or below this node, in display order.
    pub fn file_paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.is_directory {
            for child in &self.children {
                child.collect_files(out);
            }
        } else {
            out.push(&self.path);
        }
    }
}

/// One visible row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNode {
    /// Full path.
    pub path: String,
    /// Display name.
    pub name: String,
    /// Nesting level.
    pub depth: usize,
    /// Interior node.
    pub is_directory: bool,
    /// Expansion state.
    pub is_expanded: bool,
    /// Change kind.
    pub change_kind: ChangeKind,
    /// Added lines.
    pub lines_added: usize,
    /// Removed lines.
    pub lines_removed: usize,
}

/// Build a tree from a flat list of changed files.
pub fn build_tree(files: &[FileEntry]) -> Vec<TreeNode> {
    let mut roots = Vec::new();
    for entry in files {
        let segments: Vec<&str> = entry
            .path
            .as_str()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        if !segments.is_empty() {
            insert(&mut roots, &segments, "", 0, entry);
        }
    }
    for node in &mut roots {
        aggregate(node);
    }
    sort_nodes(&mut roots);
    roots
}

fn insert(nodes: &mut Vec<TreeNode>, segments: &[&str], prefix: &str, depth: usize, entry: &FileEntry) {
    let name = segments[0];
    if segments.len() == 1 {
        match nodes.iter_mut().find(|n| !n.is_directory && n.name == name) {
            Some(existing) => {
                existing.lines_added += entry.lines_added;
                existing.lines_removed += entry.lines_removed;
                existing.change_kind = ChangeKind::Modified;
            }
            None => nodes.push(TreeNode::file(name, entry, depth)),
        }
        return;
    }

    let path = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    };
    let idx = match nodes.iter().position(|n| n.is_directory && n.name == name) {
        Some(idx) => idx,
        None => {
            nodes.push(TreeNode::directory(name, path.clone(), depth));
            nodes.len() - 1
        }
    };
    insert(&mut nodes[idx].children, &segments[1..], &path, depth + 1, entry);
}

/// Fill directory counters and kinds from descendants.
fn aggregate(node: &mut TreeNode) {
    if !node.is_directory {
        return;
    }
    let mut added = 0;
    let mut removed = 0;
    let mut all_added = true;
    let mut all_deleted = true;
    for child in &mut node.children {
        aggregate(child);
        added += child.lines_added;
        removed += child.lines_removed;
        all_added &= child.change_kind == ChangeKind::Added;
        all_deleted &= child.change_kind == ChangeKind::Deleted;
    }
    node.lines_added = added;
    node.lines_removed = removed;
    node.change_kind = if all_added {
        ChangeKind::Added
    } else if all_deleted {
        ChangeKind::Deleted
    } else {
        ChangeKind::Modified
    };
}

fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.cmp(&b.name))
    });
    for node in nodes {
        sort_nodes(&mut node.children);
    }
}

/// Pre-order rows, descending only into expanded directories.
pub fn flatten(roots: &[TreeNode]) -> Vec<VisibleNode> {
    let mut out = Vec::new();
    for node in roots {
        push_visible(node, &mut out);
    }
    out
}

fn push_visible(node: &TreeNode, out: &mut Vec<VisibleNode>) {
    out.push(VisibleNode {
        path: node.path.clone(),
        name: node.name.clone(),
        depth: node.depth,
        is_directory: node.is_directory,
        is_expanded: node.is_expanded,
        change_kind: node.change_kind,
        lines_added: node.lines_added,
        lines_removed: node.lines_removed,
    });
    if node.is_directory && node.is_expanded {
        for child in &node.children {
            push_visible(child, out);
        }
    }
}

/// Keep files whose name or path contains `query` (case-insensitive).
///
/// Directories survive when a descendant does or their name matches, and are
/// force-expanded.
pub fn filter_tree(roots: &[TreeNode], query: &str) -> Vec<TreeNode> {
    let query = query.to_lowercase();
    roots
        .iter()
        .filter_map(|node| filter_node(node, &query))
        .collect()
}

fn filter_node(node: &TreeNode, query: &str) -> Option<TreeNode> {
    let name_matches = node.name.to_lowercase().contains(query);
    if !node.is_directory {
        return (name_matches || node.path.to_lowercase().contains(query)).then(|| node.clone());
    }
    let children: Vec<TreeNode> = node
        .children
        .iter()
        .filter_map(|child| filter_node(child, query))
        .collect();
    if children.is_empty() && !name_matches {
        return None;
    }
    Some(TreeNode {
        children,
        is_expanded: true,
        ..node.clone_shallow()
    })
}

impl TreeNode {
    fn clone_shallow(&self) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            is_directory: self.is_directory,
            is_expanded: self.is_expanded,
            children: Vec::new(),
            change_kind: self.change_kind,
            lines_added: self.lines_added,
            lines_removed: self.lines_removed,
            depth: self.depth,
        }
    }
}

/// Flip expansion of the directory at exactly `path`. Returns whether one was found.
pub fn toggle_expanded(roots: &mut [TreeNode], path: &str) -> bool {
    for node in roots {
        if node.is_directory && node.path == path {
            node.is_expanded = !node.is_expanded;
            return true;
        }
        if node.is_directory && toggle_expanded(&mut node.children, path) {
            return true;
        }
    }
    false
}

/// Find a node by exact path.
pub fn find_node<'a>(roots: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    for node in roots {
        if node.path == path {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, path) {
            return Some(found);
        }
    }
    None
}

/// Paths of collapsed directories.
pub fn collapsed_paths(roots: &[TreeNode]) -> HashSet<String> {
    let mut out = HashSet::new();
    collect_collapsed(roots, &mut out);
    out
}

fn collect_collapsed(nodes: &[TreeNode], out: &mut HashSet<String>) {
    for node in nodes.iter().filter(|n| n.is_directory) {
        if !node.is_expanded {
            out.insert(node.path.clone());
        }
        collect_collapsed(&node.children, out);
    }
}

/// Collapse every directory whose path is in `collapsed`.
pub fn apply_collapsed(roots: &mut [TreeNode], collapsed: &HashSet<String>) {
    for node in roots.iter_mut().filter(|n| n.is_directory) {
        if collapsed.contains(&node.path) {
            node.is_expanded = false;
        }
        apply_collapsed(&mut node.children, collapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repo::RelPath;
    use proptest::prelude::*;

    fn entry(path: &str, kind: ChangeKind, added: usize, removed: usize) -> FileEntry {
        FileEntry {
            path: RelPath::new(path),
            change_kind: kind,
            lines_added: added,
            lines_removed: removed,
        }
    }

    fn names(rows: &[VisibleNode]) -> Vec<&str> {
        rows.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn directories_sort_before_files() {
        let tree = build_tree(&[
            entry("z.txt", ChangeKind::Modified, 1, 0),
            entry("src/main.rs", ChangeKind::Modified, 1, 1),
            entry("a.txt", ChangeKind::Added, 2, 0),
            entry("src/core/diff.rs", ChangeKind::Added, 3, 0),
        ]);
        let rows = flatten(&tree);
        assert_eq!(
            names(&rows),
            vec!["src", "src/core", "src/core/diff.rs", "src/main.rs", "a.txt", "z.txt"]
        );
        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[2].depth, 2);
    }

    #[test]
    fn directory_stats_and_kind() {
        let tree = build_tree(&[
            entry("new/a", ChangeKind::Added, 2, 0),
            entry("new/b", ChangeKind::Added, 3, 0),
            entry("gone/a", ChangeKind::Deleted, 0, 4),
            entry("mixed/a", ChangeKind::Added, 1, 0),
            entry("mixed/b", ChangeKind::Deleted, 0, 1),
        ]);
        let kinds: Vec<_> = tree
            .iter()
            .map(|n| (n.name.as_str(), n.change_kind, n.lines_added, n.lines_removed))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("gone", ChangeKind::Deleted, 0, 4),
                ("mixed", ChangeKind::Modified, 1, 1),
                ("new", ChangeKind::Added, 5, 0),
            ]
        );
    }

    #[test]
    fn toggle_hides_children() {
        let mut tree = build_tree(&[entry("src/a.rs", ChangeKind::Modified, 1, 1)]);
        assert!(toggle_expanded(&mut tree, "src"));
        assert_eq!(names(&flatten(&tree)), vec!["src"]);
        assert!(toggle_expanded(&mut tree, "src"));
        assert_eq!(flatten(&tree).len(), 2);
        assert!(!toggle_expanded(&mut tree, "src/a.rs"));
        assert!(!toggle_expanded(&mut tree, "missing"));
    }

    #[test]
    fn collapsed_state_survives_rebuild() {
        let files = [
            entry("a/x", ChangeKind::Modified, 1, 0),
            entry("b/y", ChangeKind::Modified, 1, 0),
        ];
        let mut tree = build_tree(&files);
        toggle_expanded(&mut tree, "a");
        let collapsed = collapsed_paths(&tree);
        let mut rebuilt = build_tree(&files);
        apply_collapsed(&mut rebuilt, &collapsed);
        assert_eq!(names(&flatten(&rebuilt)), vec!["a", "b", "b/y"]);
    }

    #[test]
    fn filter_matches_name_or_path_case_insensitive() {
        let mut tree = build_tree(&[
            entry("src/App.rs", ChangeKind::Modified, 1, 0),
            entry("src/lib.rs", ChangeKind::Modified, 1, 0),
            entry("docs/readme.md", ChangeKind::Modified, 1, 0),
        ]);
        toggle_expanded(&mut tree, "src");
        let filtered = filter_tree(&tree, "APP");
        assert_eq!(names(&flatten(&filtered)), vec!["src", "src/App.rs"]);

        let by_dir = filter_tree(&tree, "docs");
        assert_eq!(names(&flatten(&by_dir)), vec!["docs", "docs/readme.md"]);

        assert!(filter_tree(&tree, "nothing").is_empty());
    }

    #[test]
    fn file_paths_under_directory() {
        let tree = build_tree(&[
            entry("src/b.rs", ChangeKind::Modified, 1, 0),
            entry("src/x/a.rs", ChangeKind::Modified, 1, 0),
            entry("top.rs", ChangeKind::Modified, 1, 0),
        ]);
        let src = find_node(&tree, "src").unwrap();
        assert_eq!(src.file_paths(), vec!["src/x/a.rs", "src/b.rs"]);
        assert_eq!(find_node(&tree, "top.rs").unwrap().file_paths(), vec!["top.rs"]);
    }

    fn entries_strategy() -> impl Strategy<Value = Vec<FileEntry>> {
        let kind = prop::sample::select(vec![ChangeKind::Added, ChangeKind::Deleted, ChangeKind::Modified]);
        prop::collection::btree_map("[ab]{1,2}(/[ab]{1,2}){0,2}\\.rs", (kind, 0usize..20, 0usize..20), 0..12)
            .prop_map(|m| {
                m.into_iter()
                    .map(|(p, (k, a, r))| entry(&p, k, a, r))
                    .collect()
            })
    }

    fn check_aggregation(node: &TreeNode) -> Result<(), TestCaseError> {
        if !node.is_directory {
            return Ok(());
        }
        let added: usize = node.children.iter().map(|c| c.lines_added).sum();
        prop_assert_eq!(node.lines_added, added);
        let kinds: Vec<ChangeKind> = node.children.iter().map(|c| c.change_kind).collect();
        let expected = if kinds.iter().all(|k| *k == ChangeKind::Added) {
            ChangeKind::Added
        } else if kinds.iter().all(|k| *k == ChangeKind::Deleted) {
            ChangeKind::Deleted
        } else {
            ChangeKind::Modified
        };
        prop_assert_eq!(node.change_kind, expected);
        for child in &node.children {
            check_aggregation(child)?;
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn aggregation_holds(files in entries_strategy()) {
            for node in &build_tree(&files) {
                check_aggregation(node)?;
            }
        }

        #[test]
        fn filter_is_sound(files in entries_strategy(), query in "[abAB/.]{1,3}") {
            let tree = build_tree(&files);
            let rows = flatten(&filter_tree(&tree, &query));
            let q = query.to_lowercase();
            for f in &files {
                let name = f.path.file_name().to_lowercase();
                let expected = name.contains(&q) || f.path.as_str().to_lowercase().contains(&q);
                let shown = rows.iter().any(|r| !r.is_directory && r.path == f.path.as_str());
                prop_assert_eq!(shown, expected, "path {} query {}", f.path, query);
            }
        }
    }
}
