//! Row layout of the diff panel, shared by rendering and hunk jumps.

use crate::core::{DiffLine, FileDiff, Hunk};

/// Rows above the first file in BranchCompare.
pub const BRANCH_HEADER_ROWS: usize = 2;

/// Blank rows between consecutive files.
pub const FILE_SEPARATOR_ROWS: usize = 2;

/// One row of the diff panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffRow<'a> {
    /// Comparison summary line.
    BranchSummary,
    /// Newest commit ahead, or blank.
    BranchLatestCommit,
    /// Gap between files.
    Separator,
    /// File path and stats.
    FileHeader(&'a FileDiff),
    /// `@@ -a,b +c,d @@`.
    HunkHeader(&'a Hunk),
    /// A hunk line.
    Line(&'a DiffLine),
}

/// Lay out `files` in order.
pub fn diff_rows<'a>(files: &[&'a FileDiff], branch_header: bool) -> Vec<DiffRow<'a>> {
    let mut rows = Vec::new();
    if branch_header {
        rows.push(DiffRow::BranchSummary);
        rows.push(DiffRow::BranchLatestCommit);
    }
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            rows.extend(std::iter::repeat(DiffRow::Separator).take(FILE_SEPARATOR_ROWS));
        }
        rows.push(DiffRow::FileHeader(file));
        for hunk in &file.hunks {
            rows.push(DiffRow::HunkHeader(hunk));
            rows.extend(hunk.lines.iter().map(DiffRow::Line));
        }
    }
    rows
}

/// Row indices of hunk headers.
pub fn hunk_starts(rows: &[DiffRow<'_>]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| matches!(row, DiffRow::HunkHeader(_)).then_some(i))
        .collect()
}

/// First hunk start after `scroll`, or the last one.
pub fn next_hunk(starts: &[usize], scroll: usize) -> Option<usize> {
    starts
        .iter()
        .copied()
        .find(|&s| s > scroll)
        .or_else(|| starts.last().copied())
}

/// Last hunk start before `scroll`, or the first one.
pub fn prev_hunk(starts: &[usize], scroll: usize) -> Option<usize> {
    starts
        .iter()
        .copied()
        .rev()
        .find(|&s| s < scroll)
        .or_else(|| starts.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{compute_hunks, ChangeKind, RelPath};

    fn file(path: &str) -> FileDiff {
        let old: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let mut new = old.clone();
        new[1] = "x".into();
        new[15] = "y".into();
        FileDiff::new(
            RelPath::new(path),
            ChangeKind::Modified,
            compute_hunks(&old, &new, 2).unwrap(),
        )
    }

    #[test]
    fn rows_follow_header_separator_layout() {
        let a = file("a");
        let b = file("b");
        // Each file: 2 hunks of (-,+,ctx,ctx) = 4 lines each.
        let rows = diff_rows(&[&a, &b], true);
        assert_eq!(rows[0], DiffRow::BranchSummary);
        assert_eq!(rows[2], DiffRow::FileHeader(&a));
        let per_file = 1 + 2 * (1 + 4);
        assert_eq!(rows.len(), 2 + per_file + FILE_SEPARATOR_ROWS + per_file);
        assert_eq!(hunk_starts(&rows), vec![3, 8, 16, 21]);
    }

    #[test]
    fn hunk_jumps_clamp_at_ends() {
        let starts = [1, 6, 13];
        assert_eq!(next_hunk(&starts, 0), Some(1));
        assert_eq!(next_hunk(&starts, 6), Some(13));
        assert_eq!(next_hunk(&starts, 20), Some(13));
        assert_eq!(prev_hunk(&starts, 13), Some(6));
        assert_eq!(prev_hunk(&starts, 1), Some(1));
        assert_eq!(prev_hunk(&starts, 0), Some(1));
        assert_eq!(next_hunk(&[], 0), None);
    }
}
