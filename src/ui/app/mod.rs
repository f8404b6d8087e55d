//! Session state and the reducer.

use crate::config::Config;
use crate::core::{
    apply_collapsed, build_tree, collapsed_paths, filter_tree, find_node, flatten, CommitSummary,
    DiffMode, DiffRequest, FileDiff, FileEntry, Fingerprint, TreeNode, ViewMode, VisibleNode,
    WatchRequest, UNLIMITED_CONTEXT,
};
use crate::theme::Theme;

mod filter;
mod layout;
mod load;
mod navigation;
mod state;

pub use layout::{diff_rows, hunk_starts, DiffRow, BRANCH_HEADER_ROWS, FILE_SEPARATOR_ROWS};
pub use state::{Command, Msg, Panel, SidebarState, UiState, ViewerState};

/// Rows taken by the header, footer, and borders.
const CHROME_ROWS: u16 = 5;

/// Application state.
pub struct App {
    /// Repository root.
    pub root: String,
    /// Current branch or short hash.
    pub branch: String,
    /// Default integration branch.
    pub default_branch: String,
    /// Comparison mode.
    pub mode: DiffMode,
    /// Changed paths with stats (no hunks).
    pub files: Vec<FileEntry>,
    /// Assembled diffs.
    pub diff_files: Vec<FileDiff>,
    /// Commits ahead of the default branch (BranchCompare only).
    pub commits: Vec<CommitSummary>,
    /// File tree built from `files`.
    pub tree: Vec<TreeNode>,
    /// Visible rows of the (filtered) tree.
    pub rows: Vec<VisibleNode>,
    /// Panel with the cursor.
    pub panel: Panel,
    /// Sidebar state.
    pub sidebar: SidebarState,
    /// Diff panel state.
    pub viewer: ViewerState,
    /// UI state (overlays, messages).
    pub ui: UiState,
    /// Fingerprint of what is displayed.
    pub fingerprint: Option<Fingerprint>,
    /// Should the app quit?
    pub should_quit: bool,
    /// Current color theme.
    pub theme: Theme,
    /// Snapshot fingerprint the detector is armed with.
    watch_baseline: Option<Fingerprint>,
    default_context: usize,
    context_step: usize,
}

impl App {
    /// Create the session with settings from `config`.
    pub fn new(config: &Config, theme: Theme) -> Self {
        Self {
            root: String::new(),
            branch: String::new(),
            default_branch: String::new(),
            mode: DiffMode::Unstaged,
            files: Vec::new(),
            diff_files: Vec::new(),
            commits: Vec::new(),
            tree: Vec::new(),
            rows: Vec::new(),
            panel: Panel::FileTree,
            sidebar: SidebarState::default(),
            viewer: ViewerState {
                scroll: 0,
                view_mode: ViewMode::DiffOnly,
                context: config.context_lines,
            },
            ui: UiState {
                dirty: true,
                ..Default::default()
            },
            fingerprint: None,
            should_quit: false,
            theme,
            watch_baseline: None,
            default_context: config.context_lines,
            context_step: config.context_step,
        }
    }

    /// Commands to run at startup.
    pub fn init(&self) -> Command {
        Command::Batch(vec![Command::LoadGitInfo, self.reload()])
    }

    /// Apply one event; may return a command for the runtime.
    pub fn update(&mut self, msg: Msg) -> Option<Command> {
        let cmd = match msg {
            Msg::KeyPressed(key) => super::input::handle_key(self, key),
            Msg::WindowResized { width, height } => {
                self.ui.width = width;
                self.ui.height = height;
                self.clamp_diff_scroll();
                None
            }
            Msg::GitInfoLoaded {
                root,
                branch,
                default_branch,
            } => {
                self.root = root;
                self.branch = branch;
                self.default_branch = default_branch;
                None
            }
            Msg::FilesLoaded {
                mode,
                files,
                fingerprint,
            } => {
                self.apply_files(mode, files, fingerprint);
                None
            }
            Msg::DiffsLoaded {
                request,
                files,
                fingerprint,
                skipped,
            } => self.apply_diffs(request, files, fingerprint, skipped),
            Msg::CommitsLoaded(commits) => {
                if self.mode == DiffMode::BranchCompare {
                    self.commits = commits;
                }
                None
            }
            Msg::SingleDiffLoaded {
                request,
                path,
                file,
            } => {
                self.apply_single_diff(request, path, file);
                None
            }
            Msg::ChangeDetected { request, change } => self.apply_change(request, change),
            Msg::Error(message) => {
                self.ui.error = Some(message);
                // A failed load leaves the detector disarmed.
                Some(Command::Watch(self.watch_request()))
            }
            Msg::ClearError => {
                self.ui.error = None;
                None
            }
            Msg::ShowHelp => {
                self.ui.show_help = true;
                None
            }
            Msg::HideHelp => {
                self.ui.show_help = false;
                None
            }
        };
        self.ui.dirty = true;
        cmd
    }

    /// Parameters for the current mode and view.
    pub fn diff_request(&self) -> DiffRequest {
        DiffRequest {
            mode: self.mode,
            view_mode: self.viewer.view_mode,
            context: self.viewer.context,
        }
    }

    pub(crate) fn watch_request(&self) -> WatchRequest {
        WatchRequest {
            diff: self.diff_request(),
            last_fingerprint: self.watch_baseline,
        }
    }

    /// Reload everything for the current mode.
    pub fn reload(&self) -> Command {
        let request = self.diff_request();
        match self.mode {
            DiffMode::Unstaged | DiffMode::Staged => Command::Batch(vec![
                Command::LoadFiles(self.mode),
                Command::LoadAllDiffs(request),
            ]),
            DiffMode::BranchCompare => Command::Batch(vec![
                Command::LoadCommitsAhead,
                Command::LoadBranchCompareDiff(request),
            ]),
        }
    }

    /// Context width shown in the header.
    pub fn effective_context(&self) -> usize {
        match self.viewer.view_mode {
            ViewMode::DiffOnly => self.viewer.context,
            ViewMode::WholeFile => UNLIMITED_CONTEXT,
        }
    }

    /// Diff rows that fit on screen.
    pub fn visible_rows(&self) -> usize {
        usize::from(self.ui.height.saturating_sub(CHROME_ROWS)).max(1)
    }

    /// The selected tree row.
    pub fn selected_node(&self) -> Option<&VisibleNode> {
        self.rows.get(self.sidebar.selected_idx)
    }

    /// Diffs under the selected node, in assembler order.
    pub fn selected_diffs(&self) -> Vec<&FileDiff> {
        let Some(node) = self.selected_node() else {
            return Vec::new();
        };
        if !node.is_directory {
            return self
                .diff_files
                .iter()
                .filter(|f| f.path.as_str() == node.path)
                .collect();
        }
        let paths = match find_node(&self.tree, &node.path) {
            Some(dir) => dir.file_paths(),
            None => return Vec::new(),
        };
        self.diff_files
            .iter()
            .filter(|f| paths.contains(&f.path.as_str()))
            .collect()
    }

    /// Rows of the diff panel for the current selection.
    pub fn diff_rows(&self) -> Vec<DiffRow<'_>> {
        diff_rows(
            &self.selected_diffs(),
            self.mode == DiffMode::BranchCompare,
        )
    }

    /// Rebuild the tree from `files`, keeping collapsed directories.
    pub(crate) fn rebuild_tree(&mut self) {
        let collapsed = collapsed_paths(&self.tree);
        let mut tree = build_tree(&self.files);
        apply_collapsed(&mut tree, &collapsed);
        self.tree = tree;
        self.refresh_rows();
    }

    /// Recompute visible rows after a tree, expansion, or query change.
    pub(crate) fn refresh_rows(&mut self) {
        self.rows = if self.sidebar.query.is_empty() {
            flatten(&self.tree)
        } else {
            flatten(&filter_tree(&self.tree, &self.sidebar.query))
        };
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let max = self.rows.len().saturating_sub(1);
        if self.sidebar.selected_idx > max {
            self.sidebar.selected_idx = max;
            self.viewer.scroll = 0;
        }
    }

    /// Mark dirty for redraw.
    pub fn mark_dirty(&mut self) {
        self.ui.dirty = true;
    }

    /// Clear dirty flag after drawing.
    pub fn clear_dirty(&mut self) {
        self.ui.dirty = false;
    }
}
