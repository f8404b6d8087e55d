use tracing::debug;

use super::{App, Command};
use crate::core::{
    aggregate_by_path, overlay_stats, DetectedChange, DiffMode, DiffRequest, FileDiff, FileEntry,
    Fingerprint, RelPath, ViewMode, WatchRequest,
};

impl App {
    /// Whether a result computed for `request` still matches what is shown.
    fn is_current(&self, request: &DiffRequest) -> bool {
        request.mode == self.mode
            && request.view_mode == self.viewer.view_mode
            && (request.view_mode == ViewMode::WholeFile || request.context == self.viewer.context)
    }

    pub(super) fn apply_files(
        &mut self,
        mode: DiffMode,
        mut files: Vec<FileEntry>,
        fingerprint: Fingerprint,
    ) {
        if mode != self.mode {
            debug!(?mode, "dropping stale file list");
            return;
        }
        if mode != DiffMode::BranchCompare && !self.diff_files.is_empty() {
            overlay_stats(&mut files, &self.diff_files);
        }
        self.files = files;
        self.fingerprint = Some(fingerprint);
        self.rebuild_tree();
    }

    pub(super) fn apply_diffs(
        &mut self,
        request: DiffRequest,
        files: Vec<FileDiff>,
        fingerprint: Fingerprint,
        skipped: usize,
    ) -> Option<Command> {
        if !self.is_current(&request) {
            debug!(?request, "dropping stale diffs");
            return None;
        }
        self.diff_files = files;
        if self.mode == DiffMode::BranchCompare {
            self.files = aggregate_by_path(&self.diff_files);
        } else {
            overlay_stats(&mut self.files, &self.diff_files);
        }
        self.fingerprint = Some(fingerprint);
        self.watch_baseline = Some(fingerprint);
        self.ui.status = (skipped > 0).then(|| format!("{skipped} file(s) skipped, see log"));
        self.rebuild_tree();
        self.clamp_diff_scroll();
        Some(Command::Watch(self.watch_request()))
    }

    pub(super) fn apply_single_diff(
        &mut self,
        request: DiffRequest,
        path: RelPath,
        file: Option<FileDiff>,
    ) {
        if !self.is_current(&request) {
            debug!(path = %path, "dropping stale single diff");
            return;
        }
        match file {
            Some(file) => {
                if let Some(entry) = self.files.iter_mut().find(|e| e.path == file.path) {
                    entry.lines_added = file.lines_added;
                    entry.lines_removed = file.lines_removed;
                }
                match self.diff_files.iter_mut().find(|d| d.path == file.path) {
                    Some(existing) => *existing = file,
                    None => self.diff_files.push(file),
                }
            }
            None => self.diff_files.retain(|d| d.path != path),
        }
        self.rebuild_tree();
        self.clamp_diff_scroll();
    }

    pub(super) fn apply_change(
        &mut self,
        request: WatchRequest,
        change: DetectedChange,
    ) -> Option<Command> {
        if !self.is_current(&request.diff) {
            debug!("dropping change detected for another view");
            return None;
        }
        self.fingerprint = Some(change.fingerprint);
        self.watch_baseline = Some(change.fingerprint);
        if self.mode != DiffMode::BranchCompare {
            if let Some(files) = change.files {
                self.files = files;
            }
        }
        self.diff_files.clear();
        self.rebuild_tree();
        Some(self.reload())
    }
}
