use crossterm::event::KeyEvent;

use crate::core::{
    CommitSummary, DetectedChange, DiffMode, DiffRequest, FileDiff, FileEntry, Fingerprint,
    RelPath, ViewMode, WatchRequest,
};

/// Which panel has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    /// Sidebar file tree.
    #[default]
    FileTree,
    /// Hunk display.
    Diff,
}

/// Events applied by [`super::App::update`].
#[derive(Debug, Clone)]
pub enum Msg {
    /// A key was pressed.
    KeyPressed(KeyEvent),
    /// Terminal size changed.
    WindowResized {
        /// Columns.
        width: u16,
        /// Rows.
        height: u16,
    },
    /// Repository identity resolved.
    GitInfoLoaded {
        /// Worktree root.
        root: String,
        /// Branch name or short hash.
        branch: String,
        /// Default integration branch.
        default_branch: String,
    },
    /// Path list for `mode`.
    FilesLoaded {
        /// Mode the list was computed for.
        mode: DiffMode,
        /// Paths with zero counters.
        files: Vec<FileEntry>,
        /// Fingerprint over `files`.
        fingerprint: Fingerprint,
    },
    /// All diffs for `request`.
    DiffsLoaded {
        /// Request the diffs were computed for.
        request: DiffRequest,
        /// Assembled files.
        files: Vec<FileDiff>,
        /// Snapshot fingerprint.
        fingerprint: Fingerprint,
        /// Files skipped because of read or diff errors.
        skipped: usize,
    },
    /// Commits ahead of the default branch.
    CommitsLoaded(Vec<CommitSummary>),
    /// One file re-diffed; `None` when it no longer differs.
    SingleDiffLoaded {
        /// Request the diff was computed for.
        request: DiffRequest,
        /// File path.
        path: RelPath,
        /// New diff.
        file: Option<FileDiff>,
    },
    /// The change detector saw a semantic change.
    ChangeDetected {
        /// Request the detector compared against.
        request: WatchRequest,
        /// What changed.
        change: DetectedChange,
    },
    /// User-facing error.
    Error(String),
    /// Dismiss the error.
    ClearError,
    /// Open the help overlay.
    ShowHelp,
    /// Close the help overlay.
    HideHelp,
}

/// Side effects the runtime executes; results come back as [`Msg`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve root, branch, and default branch.
    LoadGitInfo,
    /// List changed paths.
    LoadFiles(DiffMode),
    /// Assemble every diff for an Unstaged or Staged request.
    LoadAllDiffs(DiffRequest),
    /// Walk commits ahead of the default branch.
    LoadCommitsAhead,
    /// Assemble every diff against the default branch.
    LoadBranchCompareDiff(DiffRequest),
    /// Re-diff one file.
    LoadDiff {
        /// Request parameters.
        request: DiffRequest,
        /// File path.
        path: RelPath,
    },
    /// Arm the change detector.
    Watch(WatchRequest),
    /// Run several commands in order.
    Batch(Vec<Command>),
    /// Close the watcher and exit.
    Quit,
}

/// Sidebar navigation and search state.
#[derive(Debug, Default)]
pub struct SidebarState {
    /// Selected row in the visible tree.
    pub selected_idx: usize,
    /// First visible row.
    pub scroll: usize,
    /// Typing a search query.
    pub search_mode: bool,
    /// Search query (kept after leaving search mode).
    pub query: String,
}

/// Diff panel state.
#[derive(Debug)]
pub struct ViewerState {
    /// First visible diff row.
    pub scroll: usize,
    /// Hunks only or whole file.
    pub view_mode: ViewMode,
    /// Context width in DiffOnly.
    pub context: usize,
}

/// Overlay, message, and terminal state.
#[derive(Debug, Default)]
pub struct UiState {
    /// Help overlay shown.
    pub show_help: bool,
    /// Last user-facing error.
    pub error: Option<String>,
    /// Status message.
    pub status: Option<String>,
    /// Dirty flag for redraw.
    pub dirty: bool,
    /// First `g` of `gg` seen.
    pub pending_g: bool,
    /// Terminal width.
    pub width: u16,
    /// Terminal height.
    pub height: u16,
}
