//! File system watching for live reload.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Quiet period the debouncer waits for before reporting a batch of events.
pub const DEBOUNCE: Duration = Duration::from_millis(50);

/// Errors from the watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watcher was closed; no more changes will be reported.
    #[error("watcher closed")]
    Closed,
    /// The notification backend reported a failure.
    #[error("watch backend failed: {0}")]
    Backend(String),
    /// Setting up the notification backend failed.
    #[error("watch setup failed: {0}")]
    Notify(#[from] notify::Error),
}

/// Blocks until the repository changes.
pub trait Watcher: Send + Sync {
    /// Block until a relevant change is seen (debounced).
    ///
    /// Returns [`WatchError::Closed`] once [`Watcher::close`] has been called.
    fn wait_for_change(&self) -> Result<(), WatchError>;

    /// Stop watching. Idempotent.
    fn close(&self);
}

enum Signal {
    Fs,
    Failed(String),
    Close,
}

/// Which paths count as a change.
#[derive(Debug, Clone)]
struct PathFilter {
    root: PathBuf,
    git_dir: PathBuf,
    ignored: Vec<PathBuf>,
}

impl PathFilter {
    fn is_relevant(&self, path: &Path) -> bool {
        if self.ignored.iter().any(|p| p == path) {
            return false;
        }
        if let Ok(rel) = path.strip_prefix(&self.git_dir) {
            return is_tracked_git_state(rel);
        }
        match path.strip_prefix(&self.root) {
            Ok(rel) => !rel
                .components()
                .any(|c| matches!(c, Component::Normal(name) if name == ".git")),
            Err(_) => false,
        }
    }
}

/// Inside the git dir only HEAD, the index, and refs matter.
fn is_tracked_git_state(rel: &Path) -> bool {
    if rel.extension().is_some_and(|ext| ext == "lock") {
        return false;
    }
    rel == Path::new("HEAD") || rel == Path::new("index") || rel.starts_with("refs")
}

/// Watches the worktree and the repository's HEAD, index, and refs.
pub struct RepoWatcher {
    rx: Mutex<Receiver<Signal>>,
    tx: Sender<Signal>,
    closed: AtomicBool,
    /// Dropping this stops the backend.
    inner: Mutex<Option<Debouncer<RecommendedWatcher>>>,
}

impl RepoWatcher {
    /// Start watching `root` recursively, plus `git_dir` when it lives elsewhere.
    ///
    /// Events for any path in `ignored` (such as the log file) are dropped.
    pub fn new(root: &Path, git_dir: &Path, ignored: Vec<PathBuf>) -> Result<Self, WatchError> {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let git_dir = git_dir
            .canonicalize()
            .unwrap_or_else(|_| git_dir.to_path_buf());
        let filter = PathFilter {
            root: root.clone(),
            git_dir: git_dir.clone(),
            ignored,
        };

        let (tx, rx) = mpsc::channel();
        let signals = tx.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| {
            let signal = match res {
                Ok(events) if events.iter().any(|e| filter.is_relevant(&e.path)) => Signal::Fs,
                Ok(_) => return,
                Err(err) => Signal::Failed(err.to_string()),
            };
            let _ = signals.send(signal);
        })?;

        // Recursive mode picks up directories created later.
        let watcher = debouncer.watcher();
        watcher.watch(&root, RecursiveMode::Recursive)?;
        if !git_dir.starts_with(&root) {
            watcher.watch(&git_dir, RecursiveMode::Recursive)?;
        }
        debug!(root = %root.display(), git_dir = %git_dir.display(), "watching repository");

        Ok(Self {
            rx: Mutex::new(rx),
            tx,
            closed: AtomicBool::new(false),
            inner: Mutex::new(Some(debouncer)),
        })
    }
}

impl Watcher for RepoWatcher {
    fn wait_for_change(&self) -> Result<(), WatchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(WatchError::Closed);
        }
        let rx = self.rx.lock();
        match rx.recv() {
            Ok(Signal::Fs) => {}
            Ok(Signal::Failed(msg)) => return Err(WatchError::Backend(msg)),
            Ok(Signal::Close) | Err(_) => return Err(WatchError::Closed),
        }

        // Coalesce batches that queued up while the caller was busy.
        loop {
            match rx.try_recv() {
                Ok(Signal::Fs) => continue,
                Ok(Signal::Failed(msg)) => return Err(WatchError::Backend(msg)),
                Ok(Signal::Close) | Err(TryRecvError::Disconnected) => {
                    return Err(WatchError::Closed)
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if self.closed.load(Ordering::SeqCst) {
            return Err(WatchError::Closed);
        }
        Ok(())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.tx.send(Signal::Close).is_err() {
            warn!("watcher channel already gone");
        }
        self.inner.lock().take();
        debug!("watcher closed");
    }
}
