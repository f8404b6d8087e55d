//! Diff assembler: adapter reads + line differ → per-file diffs.

use thiserror::Error;
use tracing::{debug, error, warn};

use super::diff::{compute_hunks, DiffError, Hunk, UNLIMITED_CONTEXT};
use super::fingerprint::{fingerprint_files, Fingerprint};
use super::repo::{
    ChangeKind, ChangedPath, CommitSummary, DiffMode, RelPath, RepoAdapter, RepoError,
};
use super::text::TextBuffer;

/// How much of each file the diff panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// Hunks with bounded context.
    #[default]
    DiffOnly,
    /// One hunk per file spanning every line.
    WholeFile,
}

impl ViewMode {
    /// The other view mode.
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::DiffOnly => ViewMode::WholeFile,
            ViewMode::WholeFile => ViewMode::DiffOnly,
        }
    }

    /// Short label for the header.
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::DiffOnly => "diff",
            ViewMode::WholeFile => "whole file",
        }
    }
}

/// Parameters for one assembly pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiffRequest {
    /// Comparison mode.
    pub mode: DiffMode,
    /// View mode.
    pub view_mode: ViewMode,
    /// Context width used in [`ViewMode::DiffOnly`].
    pub context: usize,
}

impl DiffRequest {
    /// Context actually passed to the differ.
    pub fn effective_context(&self) -> usize {
        match self.view_mode {
            ViewMode::DiffOnly => self.context,
            ViewMode::WholeFile => UNLIMITED_CONTEXT,
        }
    }
}

/// A file's diff with hunks. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Repository-relative path.
    pub path: RelPath,
    /// Resolved change kind.
    pub change_kind: ChangeKind,
    /// Hunks in file order.
    pub hunks: Vec<Hunk>,
    /// Added lines over all hunks.
    pub lines_added: usize,
    /// Removed lines over all hunks.
    pub lines_removed: usize,
}

impl FileDiff {
    /// Build from hunks, deriving the counters.
    pub fn new(path: RelPath, change_kind: ChangeKind, hunks: Vec<Hunk>) -> Self {
        let lines_added = hunks.iter().map(Hunk::added).sum();
        let lines_removed = hunks.iter().map(Hunk::removed).sum();
        Self {
            path,
            change_kind,
            hunks,
            lines_added,
            lines_removed,
        }
    }

    /// Path-plus-stats view.
    pub fn summary(&self) -> FileEntry {
        FileEntry {
            path: self.path.clone(),
            change_kind: self.change_kind,
            lines_added: self.lines_added,
            lines_removed: self.lines_removed,
        }
    }
}

/// Path plus stats, without hunks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    /// Repository-relative path.
    pub path: RelPath,
    /// Change kind.
    pub change_kind: ChangeKind,
    /// Added lines (0 until diffs arrive).
    pub lines_added: usize,
    /// Removed lines (0 until diffs arrive).
    pub lines_removed: usize,
}

impl FileEntry {
    /// Entry with zero counters.
    pub fn new(path: RelPath, change_kind: ChangeKind) -> Self {
        Self {
            path,
            change_kind,
            lines_added: 0,
            lines_removed: 0,
        }
    }
}

/// Per-file assembly failure.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// Reading either side failed.
    #[error(transparent)]
    Repo(#[from] RepoError),
    /// The differ rejected the matcher output.
    #[error("diff failed for {path}: {source}")]
    Diff {
        /// File being diffed.
        path: RelPath,
        /// Underlying differ error.
        source: DiffError,
    },
}

/// Result of assembling a set of paths: successes plus skipped files.
#[derive(Debug, Default)]
pub struct Assembled {
    /// Files with at least one hunk, sorted by `(path, change_kind)`.
    pub files: Vec<FileDiff>,
    /// Files skipped because of an error.
    pub failures: Vec<(RelPath, AssembleError)>,
}

/// Everything a reload shows, plus its fingerprint.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Assembled files.
    pub files: Vec<FileDiff>,
    /// Commits ahead of the default branch (BranchCompare only).
    pub commits: Vec<CommitSummary>,
    /// Fingerprint over `files` and `commits`.
    pub fingerprint: Fingerprint,
    /// Number of files skipped with an error.
    pub skipped: usize,
}

/// Paths for `mode` as entries with zero counters.
pub fn list_entries(adapter: &dyn RepoAdapter, mode: DiffMode) -> Result<Vec<FileEntry>, RepoError> {
    Ok(adapter
        .list_changes(mode)?
        .into_iter()
        .map(|c| FileEntry::new(c.path, c.kind))
        .collect())
}

/// Assemble every changed path for `request.mode`.
///
/// Listing failures are returned; per-file failures are logged and collected.
pub fn assemble(adapter: &dyn RepoAdapter, request: &DiffRequest) -> Result<Assembled, RepoError> {
    let changes = adapter.list_changes(request.mode)?;
    Ok(assemble_paths(adapter, request, &changes))
}

/// Assemble the given paths.
pub fn assemble_paths(
    adapter: &dyn RepoAdapter,
    request: &DiffRequest,
    changes: &[ChangedPath],
) -> Assembled {
    let mut out = Assembled::default();
    for change in changes {
        match diff_one(adapter, change, request) {
            Ok(Some(file)) => out.files.push(file),
            Ok(None) => {}
            Err(err) => {
                match &err {
                    AssembleError::Repo(RepoError::SizeLimitExceeded { .. }) => {
                        warn!(path = %change.path, error = %err, "skipping file")
                    }
                    _ => error!(path = %change.path, error = %err, "skipping file"),
                }
                out.failures.push((change.path.clone(), err));
            }
        }
    }
    out.files
        .sort_by(|a, b| (&a.path, a.change_kind).cmp(&(&b.path, b.change_kind)));
    out
}

/// Diff one path. `None` when there is nothing to show.
pub fn diff_one(
    adapter: &dyn RepoAdapter,
    change: &ChangedPath,
    request: &DiffRequest,
) -> Result<Option<FileDiff>, AssembleError> {
    let (old, new, kind) = match request.mode {
        DiffMode::BranchCompare => {
            let contents = adapter.read_branch_compare_contents(&change.path)?;
            let kind = contents.change_kind();
            match (contents.old, contents.new) {
                (None, None) => return Ok(None),
                (old, new) => (old.unwrap_or_default(), new.unwrap_or_default(), kind),
            }
        }
        mode => {
            let contents = adapter.read_contents(change, mode)?;
            (contents.old, contents.new, contents.kind)
        }
    };

    let old = TextBuffer::new(&old);
    let new = TextBuffer::new(&new);
    if old.is_binary() || new.is_binary() {
        debug!(path = %change.path, "skipping binary file");
        return Ok(None);
    }

    let hunks = compute_hunks(&old.lines(), &new.lines(), request.effective_context()).map_err(
        |source| AssembleError::Diff {
            path: change.path.clone(),
            source,
        },
    )?;
    if hunks.is_empty() {
        return Ok(None);
    }
    Ok(Some(FileDiff::new(change.path.clone(), kind, hunks)))
}

/// Assemble files (and commits in BranchCompare) and fingerprint the result.
pub fn snapshot(adapter: &dyn RepoAdapter, request: &DiffRequest) -> Result<Snapshot, RepoError> {
    let assembled = assemble(adapter, request)?;
    let commits = match request.mode {
        DiffMode::BranchCompare => adapter.commits_ahead_of_default()?,
        _ => Vec::new(),
    };
    let fingerprint = fingerprint_files(&assembled.files, &commits);
    Ok(Snapshot {
        files: assembled.files,
        commits,
        fingerprint,
        skipped: assembled.failures.len(),
    })
}

/// Sum stats per path; a path listed more than once collapses to Modified.
pub fn aggregate_by_path(files: &[FileDiff]) -> Vec<FileEntry> {
    let mut out: Vec<FileEntry> = Vec::new();
    for file in files {
        match out.iter_mut().find(|e| e.path == file.path) {
            Some(entry) => {
                entry.lines_added += file.lines_added;
                entry.lines_removed += file.lines_removed;
                entry.change_kind = ChangeKind::Modified;
            }
            None => out.push(file.summary()),
        }
    }
    out
}

/// Copy counters from `diffs` onto matching entries in `files`.
pub fn overlay_stats(files: &mut [FileEntry], diffs: &[FileDiff]) {
    for entry in files.iter_mut() {
        if let Some(diff) = diffs.iter().find(|d| d.path == entry.path) {
            entry.lines_added = diff.lines_added;
            entry.lines_removed = diff.lines_removed;
        }
    }
}
