//! Executes [`Command`]s on worker threads and feeds results back as [`Msg`]s.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use super::app::{Command, Msg};
use crate::core::{
    diff_one, fingerprint_entries, list_entries, snapshot, ChangeDetector, RepoAdapter,
    WatchError, WatchRequest, Watcher,
};

/// Worker threads plus the channels that connect them to the event loop.
pub struct Runtime {
    load_tx: Option<Sender<Command>>,
    watch_tx: Option<Sender<WatchRequest>>,
    msg_rx: Receiver<Msg>,
    watcher: Arc<dyn Watcher>,
    handles: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("workers", &self.handles.len())
            .finish()
    }
}

impl Runtime {
    /// Start the load and watch workers.
    ///
    /// `loader` serves load commands; `detector` owns a second adapter and
    /// shares `watcher`, which [`Runtime::shutdown`] closes.
    pub fn spawn(
        loader: Box<dyn RepoAdapter>,
        detector: ChangeDetector,
        watcher: Arc<dyn Watcher>,
    ) -> Self {
        let (load_tx, load_rx) = mpsc::channel::<Command>();
        let (watch_tx, watch_rx) = mpsc::channel::<WatchRequest>();
        let (msg_tx, msg_rx) = mpsc::channel::<Msg>();

        let load_msgs = msg_tx.clone();
        let load = thread::spawn(move || load_loop(loader, load_rx, load_msgs));
        let watch = thread::spawn(move || watch_loop(detector, watch_rx, msg_tx));

        Self {
            load_tx: Some(load_tx),
            watch_tx: Some(watch_tx),
            msg_rx,
            watcher,
            handles: vec![load, watch],
        }
    }

    /// Hand a command to the workers. Returns `true` on [`Command::Quit`].
    pub fn dispatch(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Batch(cmds) => cmds
                .into_iter()
                .fold(false, |quit, cmd| self.dispatch(cmd) || quit),
            Command::Quit => {
                self.shutdown();
                true
            }
            Command::Watch(request) => {
                if let Some(tx) = &self.watch_tx {
                    let _ = tx.send(request);
                }
                false
            }
            load => {
                if let Some(tx) = &self.load_tx {
                    let _ = tx.send(load);
                }
                false
            }
        }
    }

    /// Next finished result, if any.
    pub fn try_recv(&self) -> Option<Msg> {
        self.msg_rx.try_recv().ok()
    }

    /// Close the watcher and stop both workers. Idempotent.
    pub fn shutdown(&mut self) {
        self.watcher.close();
        self.load_tx = None;
        self.watch_tx = None;
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn load_loop(adapter: Box<dyn RepoAdapter>, rx: Receiver<Command>, tx: Sender<Msg>) {
    while let Ok(cmd) = rx.recv() {
        let Some(msg) = execute_load(adapter.as_ref(), &cmd) else {
            continue;
        };
        if tx.send(msg).is_err() {
            break;
        }
    }
    debug!("load worker stopped");
}

/// Run one load command against `adapter`.
///
/// `None` for commands that are not loads.
pub fn execute_load(adapter: &dyn RepoAdapter, cmd: &Command) -> Option<Msg> {
    let msg = match cmd {
        Command::LoadGitInfo => match adapter.current_branch_or_short_hash() {
            Ok(branch) => Msg::GitInfoLoaded {
                root: adapter.root_path().display().to_string(),
                branch,
                default_branch: adapter.default_branch_name(),
            },
            Err(err) => failure("reading branch", &err),
        },
        Command::LoadFiles(mode) => match list_entries(adapter, *mode) {
            Ok(files) => Msg::FilesLoaded {
                mode: *mode,
                fingerprint: fingerprint_entries(&files),
                files,
            },
            Err(err) => failure("listing changes", &err),
        },
        Command::LoadAllDiffs(request) | Command::LoadBranchCompareDiff(request) => {
            match snapshot(adapter, request) {
                Ok(snap) => Msg::DiffsLoaded {
                    request: *request,
                    files: snap.files,
                    fingerprint: snap.fingerprint,
                    skipped: snap.skipped,
                },
                Err(err) => failure("loading diffs", &err),
            }
        }
        Command::LoadCommitsAhead => match adapter.commits_ahead_of_default() {
            Ok(commits) => Msg::CommitsLoaded(commits),
            Err(err) => failure("walking commits", &err),
        },
        Command::LoadDiff { request, path } => {
            let changes = match adapter.list_changes(request.mode) {
                Ok(changes) => changes,
                Err(err) => return Some(failure("listing changes", &err)),
            };
            let file = match changes.iter().find(|c| &c.path == path) {
                Some(change) => match diff_one(adapter, change, request) {
                    Ok(file) => file,
                    Err(err) => return Some(failure("loading diff", &err)),
                },
                None => None,
            };
            Msg::SingleDiffLoaded {
                request: *request,
                path: path.clone(),
                file,
            }
        }
        Command::Watch(_) | Command::Batch(_) | Command::Quit => return None,
    };
    Some(msg)
}

fn failure(action: &str, err: &dyn std::error::Error) -> Msg {
    error!(error = %err, "{action} failed");
    Msg::Error(format!("{action}: {err}"))
}

fn watch_loop(detector: ChangeDetector, rx: Receiver<WatchRequest>, tx: Sender<Msg>) {
    let mut armed: Option<WatchRequest> = None;
    loop {
        if !adopt_newest(&rx, &mut armed) {
            break;
        }
        if armed.is_none() {
            match rx.recv() {
                Ok(request) => armed = Some(request),
                Err(_) => break,
            }
            continue;
        }

        match detector.wait() {
            Ok(()) => {}
            Err(WatchError::Closed) => break,
            Err(err) => {
                error!(error = %err, "watcher failed, live reload stopped");
                let _ = tx.send(Msg::Error(format!("watcher: {err}")));
                break;
            }
        }

        if !adopt_newest(&rx, &mut armed) {
            break;
        }
        let Some(request) = armed else {
            continue;
        };
        if let Some(change) = detector.check(&request) {
            info!(fingerprint = %change.fingerprint, "change detected");
            if tx.send(Msg::ChangeDetected { request, change }).is_err() {
                break;
            }
            armed = None;
        }
    }
    debug!("watch worker stopped");
}

/// Replace `armed` with the newest queued request. `false` once the sender is gone.
fn adopt_newest(rx: &Receiver<WatchRequest>, armed: &mut Option<WatchRequest>) -> bool {
    loop {
        match rx.try_recv() {
            Ok(request) => *armed = Some(request),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}
