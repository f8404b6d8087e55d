//! Repository adapter: mode-specific reads over a version-control handle.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use git2::{
    BranchType, Commit, Delta, DiffFindOptions, DiffOptions, ErrorCode, Index, ObjectType,
    Repository, Sort, Status, StatusOptions, Tree,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum file size to load (10 MiB). Either side above this skips the file.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Commit cap when the current branch has no merge base with the default branch.
pub const DIVERGED_COMMIT_CAP: usize = 50;

/// Default branch candidates, in preference order.
const DEFAULT_BRANCH_CANDIDATES: [&str; 3] = ["main", "master", "develop"];

/// Fallback when no candidate resolves.
const FALLBACK_DEFAULT_BRANCH: &str = "main";

/// Errors from repository operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepoError {
    /// The current directory is not inside a repository with a working tree.
    #[error("not inside a git repository")]
    NotARepository,
    /// HEAD, the default branch, or a tip could not be resolved.
    #[error("reference not found: {0}")]
    ReferenceMissing(String),
    /// A blob, index entry, or worktree file could not be read.
    #[error("failed to read {path}: {reason}")]
    Read {
        /// Repository-relative path.
        path: String,
        /// What went wrong.
        reason: String,
    },
    /// One side of the file exceeds [`MAX_FILE_SIZE`].
    #[error("{path} is too large: {size} bytes (max {max} bytes)")]
    SizeLimitExceeded {
        /// Repository-relative path.
        path: String,
        /// Actual size.
        size: u64,
        /// Allowed size.
        max: u64,
    },
    /// libgit2 failure.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    /// I/O error while touching the worktree.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A repository-relative path with `/` separators. Never absolute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelPath(String);

impl RelPath {
    /// Wrap a path reported by git.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        debug_assert!(
            !path.starts_with('/'),
            "RelPath must not be absolute: {}",
            path
        );
        Self(path)
    }

    /// Get the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ChangeKind {
    /// Content differs on both sides.
    #[default]
    Modified,
    /// Only the new side exists.
    Added,
    /// Only the old side exists.
    Deleted,
    /// Moved from another path (staged renames only).
    Renamed,
}

impl ChangeKind {
    /// One-letter status tag.
    pub fn tag(self) -> char {
        match self {
            ChangeKind::Modified => 'M',
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Renamed => 'R',
        }
    }
}

/// Which pair of states is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiffMode {
    /// Index vs worktree, plus untracked files.
    #[default]
    Unstaged,
    /// Committed tip vs index.
    Staged,
    /// Default-branch tip vs worktree.
    BranchCompare,
}

impl DiffMode {
    /// Next mode in the `s` cycle.
    pub fn next(self) -> Self {
        match self {
            DiffMode::Unstaged => DiffMode::Staged,
            DiffMode::Staged => DiffMode::BranchCompare,
            DiffMode::BranchCompare => DiffMode::Unstaged,
        }
    }

    /// Short label for the header.
    pub fn label(self) -> &'static str {
        match self {
            DiffMode::Unstaged => "unstaged",
            DiffMode::Staged => "staged",
            DiffMode::BranchCompare => "branch",
        }
    }
}

/// A changed path as listed by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    /// Path to the file.
    pub path: RelPath,
    /// Type of change.
    pub kind: ChangeKind,
    /// For renames, the original path.
    pub old_path: Option<RelPath>,
}

impl ChangedPath {
    /// Create a plain entry.
    pub fn new(path: impl Into<RelPath>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            old_path: None,
        }
    }

    /// Create a renamed entry.
    pub fn renamed(old_path: impl Into<RelPath>, new_path: impl Into<RelPath>) -> Self {
        Self {
            path: new_path.into(),
            kind: ChangeKind::Renamed,
            old_path: Some(old_path.into()),
        }
    }

    /// Path the old side is read from.
    pub fn source_path(&self) -> &RelPath {
        self.old_path.as_ref().unwrap_or(&self.path)
    }
}

/// Old and new bytes for one path. A missing side is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileContents {
    /// Old side bytes.
    pub old: Vec<u8>,
    /// New side bytes.
    pub new: Vec<u8>,
    /// Change kind after reading both sides.
    pub kind: ChangeKind,
}

/// Branch-compare bytes; `None` means the side does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchContents {
    /// Blob at the default-branch tip.
    pub old: Option<Vec<u8>>,
    /// Worktree bytes.
    pub new: Option<Vec<u8>>,
}

impl BranchContents {
    /// Added when the old side is absent, Deleted when the new side is, else Modified.
    pub fn change_kind(&self) -> ChangeKind {
        match (&self.old, &self.new) {
            (None, _) => ChangeKind::Added,
            (_, None) => ChangeKind::Deleted,
            _ => ChangeKind::Modified,
        }
    }
}

/// One commit on the current branch that the default branch lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Full hex id.
    pub hash: String,
    /// First 7 characters of `hash`.
    pub short_hash: String,
    /// Author name.
    pub author: String,
    /// First line of the message.
    pub summary: String,
    /// Commit time as `YYYY-MM-DD HH:MM` in the committer's offset.
    pub date: String,
}

impl CommitSummary {
    fn from_commit(commit: &Commit<'_>) -> Self {
        let hash = commit.id().to_string();
        Self {
            short_hash: short_id(&hash),
            author: commit.author().name().unwrap_or_default().to_string(),
            summary: commit.summary().unwrap_or_default().to_string(),
            date: format_commit_time(commit.time()),
            hash,
        }
    }
}

fn short_id(hash: &str) -> String {
    hash.chars().take(7).collect()
}

fn format_commit_time(time: git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .or_else(|| FixedOffset::east_opt(0));
    match (DateTime::from_timestamp(time.seconds(), 0), offset) {
        (Some(utc), Some(offset)) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        _ => String::new(),
    }
}

/// Capability the assembler and runtime need from the version-control host.
///
/// Implementations need not allow concurrent calls; each worker owns its own.
pub trait RepoAdapter: Send {
    /// Absolute worktree root.
    fn root_path(&self) -> &Path;

    /// Current branch name, or the 7-char short id when detached.
    fn current_branch_or_short_hash(&self) -> Result<String, RepoError>;

    /// Changed paths for `mode`, sorted by path.
    fn list_changes(&self, mode: DiffMode) -> Result<Vec<ChangedPath>, RepoError>;

    /// Old and new bytes for one listed path.
    fn read_contents(&self, change: &ChangedPath, mode: DiffMode)
        -> Result<FileContents, RepoError>;

    /// First of `main`, `master`, `develop` that resolves, else `main`.
    fn default_branch_name(&self) -> String;

    /// Commits on the current branch that are not on the default branch, newest first.
    fn commits_ahead_of_default(&self) -> Result<Vec<CommitSummary>, RepoError>;

    /// Paths that differ from the default-branch tip, sorted.
    fn branch_compare_files(&self) -> Result<Vec<RelPath>, RepoError>;

    /// Default-branch blob and worktree bytes for one path.
    fn read_branch_compare_contents(&self, path: &RelPath) -> Result<BranchContents, RepoError>;
}

/// [`RepoAdapter`] backed by libgit2.
pub struct GitRepo {
    repo: Repository,
    root: PathBuf,
}

impl fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepo").field("root", &self.root).finish()
    }
}

impl GitRepo {
    /// Locate the repository by walking upwards from the current directory.
    pub fn open_at_current_dir() -> Result<Self, RepoError> {
        let cwd = std::env::current_dir()?;
        Self::discover(&cwd)
    }

    /// Locate the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self, RepoError> {
        let repo = Repository::discover(path).map_err(|_| RepoError::NotARepository)?;
        Self::from_repository(repo)
    }

    /// Open the repository whose worktree root is exactly `root`.
    pub fn open(root: &Path) -> Result<Self, RepoError> {
        let repo = Repository::open(root).map_err(|_| RepoError::NotARepository)?;
        Self::from_repository(repo)
    }

    fn from_repository(repo: Repository) -> Result<Self, RepoError> {
        let workdir = repo.workdir().ok_or(RepoError::NotARepository)?;
        let root = workdir
            .canonicalize()
            .unwrap_or_else(|_| workdir.to_path_buf());
        Ok(Self { repo, root })
    }

    /// The internal `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    fn fresh_index(&self) -> Result<Index, RepoError> {
        let mut index = self.repo.index()?;
        index.read(false)?;
        Ok(index)
    }

    /// HEAD commit, or `None` on an unborn branch.
    fn head_commit(&self) -> Result<Option<Commit<'_>>, RepoError> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn head_tree(&self) -> Result<Option<Tree<'_>>, RepoError> {
        Ok(match self.head_commit()? {
            Some(commit) => Some(commit.tree()?),
            None => None,
        })
    }

    /// Tip of the default branch, local first, then `origin/`.
    fn default_tip(&self) -> Result<Option<Commit<'_>>, RepoError> {
        let name = self.default_branch_name();
        for refname in [
            format!("refs/heads/{name}"),
            format!("refs/remotes/origin/{name}"),
        ] {
            match self.repo.find_reference(&refname) {
                Ok(reference) => return Ok(Some(reference.peel_to_commit()?)),
                Err(e) if is_missing(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, BranchType::Local).is_ok()
            || self
                .repo
                .find_reference(&format!("refs/remotes/origin/{name}"))
                .is_ok()
    }

    fn list_unstaged(&self) -> Result<Vec<ChangedPath>, RepoError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut files = Vec::new();
        for entry in statuses.iter() {
            let status = entry.status();
            let kind = if status.contains(Status::WT_NEW) {
                ChangeKind::Added
            } else if status.contains(Status::WT_DELETED) {
                ChangeKind::Deleted
            } else if status.intersects(
                Status::WT_MODIFIED | Status::WT_TYPECHANGE | Status::WT_RENAMED,
            ) || status.is_conflicted()
            {
                ChangeKind::Modified
            } else {
                continue;
            };
            let Some(path) = entry.path() else {
                debug!(status = ?status, "skipping non utf-8 path");
                continue;
            };
            files.push(ChangedPath::new(path, kind));
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn list_staged(&self) -> Result<Vec<ChangedPath>, RepoError> {
        let Some(tree) = self.head_tree()? else {
            return Ok(Vec::new());
        };
        let index = self.fresh_index()?;
        let mut opts = DiffOptions::new();
        opts.ignore_submodules(true);
        let mut diff = self
            .repo
            .diff_tree_to_index(Some(&tree), Some(&index), Some(&mut opts))?;
        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            let new_path = delta.new_file().path().and_then(Path::to_str);
            let old_path = delta.old_file().path().and_then(Path::to_str);
            let change = match (delta.status(), old_path, new_path) {
                (Delta::Added, _, Some(path)) => ChangedPath::new(path, ChangeKind::Added),
                (Delta::Deleted, Some(path), _) => ChangedPath::new(path, ChangeKind::Deleted),
                (Delta::Renamed, Some(old), Some(new)) => ChangedPath::renamed(old, new),
                (Delta::Modified | Delta::Typechange, _, Some(path)) => {
                    ChangedPath::new(path, ChangeKind::Modified)
                }
                _ => continue,
            };
            files.push(change);
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn index_blob(&self, index: &Index, path: &RelPath) -> Result<Option<Vec<u8>>, RepoError> {
        let Some(entry) = index.get_path(Path::new(path.as_str()), 0) else {
            return Ok(None);
        };
        check_size(path, u64::from(entry.file_size))?;
        let blob = self
            .repo
            .find_blob(entry.id)
            .map_err(|e| read_error(path, &e))?;
        check_size(path, blob.size() as u64)?;
        Ok(Some(blob.content().to_vec()))
    }

    fn tree_blob(&self, tree: &Tree<'_>, path: &RelPath) -> Result<Option<Vec<u8>>, RepoError> {
        let entry = match tree.get_path(Path::new(path.as_str())) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(read_error(path, &e)),
        };
        if entry.kind() != Some(ObjectType::Blob) {
            return Ok(None);
        }
        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| read_error(path, &e))?;
        check_size(path, blob.size() as u64)?;
        Ok(Some(blob.content().to_vec()))
    }

    /// Worktree bytes. Symlinks yield their target like git stores them.
    fn worktree_bytes(&self, path: &RelPath) -> Result<Option<Vec<u8>>, RepoError> {
        let full_path = self.root.join(path.as_str());
        let meta = match fs::symlink_metadata(&full_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_error(path, &e)),
        };
        if meta.file_type().is_symlink() {
            let target = fs::read_link(&full_path).map_err(|e| read_error(path, &e))?;
            return Ok(Some(target.to_string_lossy().into_owned().into_bytes()));
        }
        if !meta.is_file() {
            return Ok(None);
        }
        check_size(path, meta.len())?;
        match fs::read(&full_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(read_error(path, &e)),
        }
    }
}

impl RepoAdapter for GitRepo {
    fn root_path(&self) -> &Path {
        &self.root
    }

    fn current_branch_or_short_hash(&self) -> Result<String, RepoError> {
        match self.repo.head() {
            Ok(head) => {
                if self.repo.head_detached()? {
                    let oid = head
                        .target()
                        .ok_or_else(|| RepoError::ReferenceMissing("HEAD".into()))?;
                    Ok(short_id(&oid.to_string()))
                } else {
                    Ok(head.shorthand().unwrap_or("HEAD").to_string())
                }
            }
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                // Unborn: HEAD still names the branch it will create.
                let head = self.repo.find_reference("HEAD")?;
                let target = head.symbolic_target().unwrap_or("HEAD");
                Ok(target.trim_start_matches("refs/heads/").to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_changes(&self, mode: DiffMode) -> Result<Vec<ChangedPath>, RepoError> {
        match mode {
            DiffMode::Unstaged => self.list_unstaged(),
            DiffMode::Staged => self.list_staged(),
            DiffMode::BranchCompare => Ok(self
                .branch_compare_files()?
                .into_iter()
                .map(|path| ChangedPath::new(path, ChangeKind::Modified))
                .collect()),
        }
    }

    fn read_contents(
        &self,
        change: &ChangedPath,
        mode: DiffMode,
    ) -> Result<FileContents, RepoError> {
        match mode {
            DiffMode::Unstaged => {
                let old = if change.kind == ChangeKind::Added {
                    None
                } else {
                    let index = self.fresh_index()?;
                    self.index_blob(&index, &change.path)?
                };
                let new = if change.kind == ChangeKind::Deleted {
                    None
                } else {
                    self.worktree_bytes(&change.path)?
                };
                Ok(FileContents {
                    old: old.unwrap_or_default(),
                    new: new.unwrap_or_default(),
                    kind: change.kind,
                })
            }
            DiffMode::Staged => {
                let old = match self.head_tree()? {
                    Some(tree) => self.tree_blob(&tree, change.source_path())?,
                    None => None,
                };
                let index = self.fresh_index()?;
                let new = self.index_blob(&index, &change.path)?;
                Ok(FileContents {
                    old: old.unwrap_or_default(),
                    new: new.unwrap_or_default(),
                    kind: change.kind,
                })
            }
            DiffMode::BranchCompare => {
                let contents = self.read_branch_compare_contents(&change.path)?;
                let kind = contents.change_kind();
                Ok(FileContents {
                    old: contents.old.unwrap_or_default(),
                    new: contents.new.unwrap_or_default(),
                    kind,
                })
            }
        }
    }

    fn default_branch_name(&self) -> String {
        DEFAULT_BRANCH_CANDIDATES
            .iter()
            .find(|name| self.branch_exists(name))
            .unwrap_or(&FALLBACK_DEFAULT_BRANCH)
            .to_string()
    }

    fn commits_ahead_of_default(&self) -> Result<Vec<CommitSummary>, RepoError> {
        let Some(head) = self.head_commit()? else {
            warn!("HEAD has no commits; no commits ahead");
            return Ok(Vec::new());
        };
        let Some(base) = self.default_tip()? else {
            warn!(branch = %self.default_branch_name(), "default branch not found");
            return Ok(Vec::new());
        };

        let merge_base = match self.repo.merge_base(head.id(), base.id()) {
            Ok(oid) => Some(oid),
            Err(e) if e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        walk.push(head.id())?;
        let cap = match merge_base {
            Some(oid) => {
                walk.hide(oid)?;
                usize::MAX
            }
            None => DIVERGED_COMMIT_CAP,
        };

        let mut commits = Vec::new();
        let walked = walk.try_for_each(|oid| {
            if commits.len() >= cap {
                return ControlFlow::Break(None);
            }
            match oid.and_then(|oid| self.repo.find_commit(oid)) {
                Ok(commit) => {
                    commits.push(CommitSummary::from_commit(&commit));
                    ControlFlow::Continue(())
                }
                Err(e) => ControlFlow::Break(Some(e)),
            }
        });
        // Reaching the cap is a normal stop.
        if let ControlFlow::Break(Some(err)) = walked {
            return Err(err.into());
        }
        Ok(commits)
    }

    fn branch_compare_files(&self) -> Result<Vec<RelPath>, RepoError> {
        let mut paths = BTreeSet::new();

        match (self.default_tip()?, self.head_tree()?) {
            (Some(base), Some(head_tree)) => {
                let base_tree = base.tree()?;
                let diff = self
                    .repo
                    .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)?;
                for delta in diff.deltas() {
                    for file in [delta.old_file(), delta.new_file()] {
                        if let Some(path) = file.path().and_then(Path::to_str) {
                            paths.insert(RelPath::new(path));
                        }
                    }
                }
            }
            (None, _) => {
                warn!(
                    branch = %self.default_branch_name(),
                    "default branch not found; comparing worktree changes only"
                );
            }
            (Some(_), None) => warn!("HEAD has no commits; comparing worktree changes only"),
        }

        for change in self
            .list_unstaged()?
            .into_iter()
            .chain(self.list_staged()?)
        {
            if let Some(old) = change.old_path {
                paths.insert(old);
            }
            paths.insert(change.path);
        }
        Ok(paths.into_iter().collect())
    }

    fn read_branch_compare_contents(&self, path: &RelPath) -> Result<BranchContents, RepoError> {
        let old = match self.default_tip()? {
            Some(base) => self.tree_blob(&base.tree()?, path)?,
            None => None,
        };
        let new = self.worktree_bytes(path)?;
        Ok(BranchContents { old, new })
    }
}

fn is_missing(e: &git2::Error) -> bool {
    matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

fn check_size(path: &RelPath, size: u64) -> Result<(), RepoError> {
    if size > MAX_FILE_SIZE {
        return Err(RepoError::SizeLimitExceeded {
            path: path.to_string(),
            size,
            max: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

fn read_error(path: &RelPath, err: &dyn std::error::Error) -> RepoError {
    RepoError::Read {
        path: path.to_string(),
        reason: err.to_string(),
    }
}
