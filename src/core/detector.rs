//! Change detector: watcher events filtered through the content fingerprint.

use std::sync::Arc;

use tracing::{debug, warn};

use super::assemble::{list_entries, overlay_stats, snapshot, DiffRequest, FileEntry};
use super::fingerprint::Fingerprint;
use super::repo::{DiffMode, RepoAdapter};
use super::watcher::{WatchError, Watcher};

/// What the detector compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchRequest {
    /// Mode, view mode, and context the model is showing.
    pub diff: DiffRequest,
    /// Fingerprint of what the model is showing.
    pub last_fingerprint: Option<Fingerprint>,
}

/// A semantic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedChange {
    /// Fingerprint of the new state.
    pub fingerprint: Fingerprint,
    /// Fresh path list (not in BranchCompare).
    pub files: Option<Vec<FileEntry>>,
}

/// Composes a [`Watcher`] with the assembler to report only real changes.
pub struct ChangeDetector {
    watcher: Arc<dyn Watcher>,
    adapter: Box<dyn RepoAdapter>,
}

impl ChangeDetector {
    /// Build a detector with its own adapter.
    pub fn new(watcher: Arc<dyn Watcher>, adapter: Box<dyn RepoAdapter>) -> Self {
        Self { watcher, adapter }
    }

    /// Block for the next filesystem change.
    pub fn wait(&self) -> Result<(), WatchError> {
        self.watcher.wait_for_change()
    }

    /// Recompute the fingerprint for `request`; `Some` when it differs.
    ///
    /// Adapter failures are logged and treated as "no change".
    pub fn check(&self, request: &WatchRequest) -> Option<DetectedChange> {
        let snap = match snapshot(self.adapter.as_ref(), &request.diff) {
            Ok(snap) => snap,
            Err(err) => {
                warn!(error = %err, "change detection failed");
                return None;
            }
        };
        if Some(snap.fingerprint) == request.last_fingerprint {
            debug!(fingerprint = %snap.fingerprint, "filesystem event without content change");
            return None;
        }

        let files = match request.diff.mode {
            DiffMode::BranchCompare => None,
            mode => match list_entries(self.adapter.as_ref(), mode) {
                Ok(mut entries) => {
                    overlay_stats(&mut entries, &snap.files);
                    Some(entries)
                }
                Err(err) => {
                    warn!(error = %err, "listing changes failed");
                    None
                }
            },
        };
        Some(DetectedChange {
            fingerprint: snap.fingerprint,
            files,
        })
    }

    /// Wait for one filesystem change, then check it.
    pub fn poll_once(&self, request: &WatchRequest) -> Result<Option<DetectedChange>, WatchError> {
        self.wait()?;
        Ok(self.check(request))
    }
}
