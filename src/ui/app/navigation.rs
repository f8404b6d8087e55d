use super::layout::{hunk_starts, next_hunk, prev_hunk};
use super::{App, Command, Panel};
use crate::core::{toggle_expanded, DiffMode, RelPath, ViewMode};

impl App {
    /// Move the tree selection by `delta` rows.
    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let max = self.rows.len() - 1;
        let next = self
            .sidebar
            .selected_idx
            .saturating_add_signed(delta)
            .min(max);
        if next != self.sidebar.selected_idx {
            self.sidebar.selected_idx = next;
            self.viewer.scroll = 0;
        }
        self.keep_selection_visible();
    }

    fn keep_selection_visible(&mut self) {
        let height = self.visible_rows();
        let idx = self.sidebar.selected_idx;
        if idx < self.sidebar.scroll {
            self.sidebar.scroll = idx;
        } else if idx >= self.sidebar.scroll + height {
            self.sidebar.scroll = idx + 1 - height;
        }
    }

    /// Largest diff scroll that still fills the panel.
    pub fn max_diff_scroll(&self) -> usize {
        self.diff_rows().len().saturating_sub(self.visible_rows())
    }

    /// Scroll the diff panel by `delta` rows.
    pub fn scroll_diff(&mut self, delta: isize) {
        self.viewer.scroll = self
            .viewer
            .scroll
            .saturating_add_signed(delta)
            .min(self.max_diff_scroll());
    }

    pub(crate) fn clamp_diff_scroll(&mut self) {
        self.viewer.scroll = self.viewer.scroll.min(self.max_diff_scroll());
    }

    /// Jump to the next hunk header.
    pub fn jump_next_hunk(&mut self) {
        let starts = hunk_starts(&self.diff_rows());
        if let Some(target) = next_hunk(&starts, self.viewer.scroll) {
            self.viewer.scroll = target;
        }
    }

    /// Jump to the previous hunk header.
    pub fn jump_prev_hunk(&mut self) {
        let starts = hunk_starts(&self.diff_rows());
        if let Some(target) = prev_hunk(&starts, self.viewer.scroll) {
            self.viewer.scroll = target;
        }
    }

    /// Whether `gg`, `G`, and line scrolling act on the diff panel.
    pub fn diff_has_cursor(&self) -> bool {
        self.panel == Panel::Diff || self.viewer.view_mode == ViewMode::WholeFile
    }

    /// Scroll the diff to the first row.
    pub fn scroll_top(&mut self) {
        self.viewer.scroll = 0;
    }

    /// Scroll the diff so its last row is at the bottom.
    pub fn scroll_bottom(&mut self) {
        self.viewer.scroll = self.max_diff_scroll();
    }

    /// Swap the panel with the cursor. Fixed to the diff in WholeFile.
    pub fn toggle_panel(&mut self) {
        if self.viewer.view_mode == ViewMode::WholeFile {
            return;
        }
        self.panel = match self.panel {
            Panel::FileTree => Panel::Diff,
            Panel::Diff => Panel::FileTree,
        };
    }

    /// Enter/Space on the tree: toggle a directory or refresh a file.
    pub fn activate_selection(&mut self) -> Option<Command> {
        let node = self.selected_node()?.clone();
        if node.is_directory {
            if toggle_expanded(&mut self.tree, &node.path) {
                self.refresh_rows();
                self.keep_selection_visible();
            }
            return None;
        }
        self.viewer.scroll = 0;
        if self.mode == DiffMode::BranchCompare {
            return None;
        }
        Some(Command::LoadDiff {
            request: self.diff_request(),
            path: RelPath::new(node.path),
        })
    }

    /// Unstaged → Staged → BranchCompare → Unstaged.
    pub fn cycle_mode(&mut self) -> Command {
        self.mode = self.mode.next();
        self.files.clear();
        self.diff_files.clear();
        self.commits.clear();
        self.fingerprint = None;
        self.watch_baseline = None;
        self.reset_view();
        self.reload()
    }

    /// Toggle DiffOnly / WholeFile.
    pub fn toggle_view_mode(&mut self) -> Command {
        self.viewer.view_mode = self.viewer.view_mode.toggle();
        if self.viewer.view_mode == ViewMode::WholeFile {
            self.panel = Panel::Diff;
        }
        self.diff_files.clear();
        self.watch_baseline = None;
        self.viewer.scroll = 0;
        self.clear_query();
        self.refresh_rows();
        self.reload()
    }

    /// Widen the context by one step (DiffOnly only).
    pub fn widen_context(&mut self) -> Option<Command> {
        if self.viewer.view_mode != ViewMode::DiffOnly {
            return None;
        }
        self.viewer.context = self.viewer.context.saturating_add(self.context_step);
        Some(self.reload())
    }

    /// Restore the configured context (DiffOnly only).
    pub fn reset_context(&mut self) -> Option<Command> {
        if self.viewer.view_mode != ViewMode::DiffOnly {
            return None;
        }
        self.viewer.context = self.default_context;
        Some(self.reload())
    }

    fn reset_view(&mut self) {
        self.sidebar.selected_idx = 0;
        self.sidebar.scroll = 0;
        self.viewer.scroll = 0;
        self.clear_query();
        self.rebuild_tree();
    }
}
