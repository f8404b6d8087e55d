//! Integration tests with real git repositories.

use std::fs;
use std::path::Path;

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

use hunkwatch::core::{
    list_entries, snapshot, ChangeKind, DiffMode, DiffRequest, GitRepo, RepoAdapter, RepoError,
    ViewMode, DEFAULT_CONTEXT, DIVERGED_COMMIT_CAP, MAX_FILE_SIZE,
};

/// Empty repository whose unborn branch is `main`.
fn init_repo() -> (TempDir, Repository) {
    init_repo_on("main")
}

fn init_repo_on(branch: &str) -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(branch);
    let repo = Repository::init_opts(dir.path(), &opts).unwrap();
    (dir, repo)
}

fn write(dir: &Path, path: &str, content: &str) {
    let full = dir.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

fn stage_all(repo: &Repository) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.update_all(["*"].iter(), None).unwrap();
    index.write().unwrap();
}

/// Stage everything and commit on HEAD.
fn commit_all(repo: &Repository, message: &str) {
    stage_all(repo);
    let mut index = repo.index().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test", "test@test.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

/// Repository with one commit holding `file.txt`.
fn create_test_repo() -> (TempDir, Repository) {
    let (dir, repo) = init_repo();
    write(dir.path(), "file.txt", "one\ntwo\nthree\n");
    commit_all(&repo, "initial");
    (dir, repo)
}

fn request(mode: DiffMode) -> DiffRequest {
    DiffRequest {
        mode,
        view_mode: ViewMode::DiffOnly,
        context: DEFAULT_CONTEXT,
    }
}

#[test]
fn plain_directory_is_not_a_repository() {
    let dir = TempDir::new().unwrap();
    let err = GitRepo::discover(dir.path()).unwrap_err();
    assert!(matches!(err, RepoError::NotARepository), "{err:?}");
}

#[test]
fn discovery_from_a_subdirectory_finds_the_root() {
    let (dir, _repo) = create_test_repo();
    fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
    let repo = GitRepo::discover(&dir.path().join("nested/deeper")).unwrap();
    assert_eq!(
        repo.root_path(),
        dir.path().canonicalize().unwrap().as_path()
    );
}

#[test]
fn clean_repo_has_no_changes() {
    let (dir, _repo) = create_test_repo();
    let repo = GitRepo::discover(dir.path()).unwrap();
    for mode in [DiffMode::Unstaged, DiffMode::Staged] {
        assert!(repo.list_changes(mode).unwrap().is_empty(), "{mode:?}");
    }
    assert_eq!(repo.current_branch_or_short_hash().unwrap(), "main");
}

#[test]
fn unstaged_lists_modified_deleted_and_untracked() {
    let (dir, raw) = init_repo();
    write(dir.path(), "keep.txt", "a\n");
    write(dir.path(), "gone.txt", "b\n");
    commit_all(&raw, "initial");

    write(dir.path(), "keep.txt", "a\nb\n");
    fs::remove_file(dir.path().join("gone.txt")).unwrap();
    write(dir.path(), "src/new.rs", "fn main() {}\n");

    let repo = GitRepo::discover(dir.path()).unwrap();
    let changes: Vec<(String, ChangeKind)> = repo
        .list_changes(DiffMode::Unstaged)
        .unwrap()
        .into_iter()
        .map(|c| (c.path.to_string(), c.kind))
        .collect();
    assert_eq!(
        changes,
        vec![
            ("gone.txt".to_string(), ChangeKind::Deleted),
            ("keep.txt".to_string(), ChangeKind::Modified),
            ("src/new.rs".to_string(), ChangeKind::Added),
        ]
    );
    assert!(repo.list_changes(DiffMode::Staged).unwrap().is_empty());
}

#[test]
fn unstaged_snapshot_diffs_against_the_index() {
    let (dir, raw) = create_test_repo();
    write(dir.path(), "file.txt", "one\nTWO\nthree\n");
    stage_all(&raw);
    write(dir.path(), "file.txt", "one\nTWO\nthree\nfour\n");

    let repo = GitRepo::discover(dir.path()).unwrap();
    let snap = snapshot(&repo, &request(DiffMode::Unstaged)).unwrap();
    assert_eq!(snap.files.len(), 1);
    let file = &snap.files[0];
    assert_eq!(file.path.as_str(), "file.txt");
    assert_eq!((file.lines_added, file.lines_removed), (1, 0));
    assert_eq!(snap.skipped, 0);
    assert!(snap.commits.is_empty());
}

#[test]
fn staged_snapshot_diffs_head_against_the_index() {
    let (dir, raw) = create_test_repo();
    write(dir.path(), "file.txt", "one\nTWO\nthree\n");
    stage_all(&raw);
    write(dir.path(), "file.txt", "unstaged noise\n");

    let repo = GitRepo::discover(dir.path()).unwrap();
    let snap = snapshot(&repo, &request(DiffMode::Staged)).unwrap();
    assert_eq!(snap.files.len(), 1);
    let file = &snap.files[0];
    assert_eq!(file.change_kind, ChangeKind::Modified);
    assert_eq!((file.lines_added, file.lines_removed), (1, 1));
    let header = file.hunks[0].header();
    assert_eq!(header, "@@ -2,2 +2,2 @@");
}

#[test]
fn staged_rename_is_detected() {
    let (dir, raw) = create_test_repo();
    fs::rename(dir.path().join("file.txt"), dir.path().join("moved.txt")).unwrap();
    let mut index = raw.index().unwrap();
    index.remove_path(Path::new("file.txt")).unwrap();
    index.add_path(Path::new("moved.txt")).unwrap();
    index.write().unwrap();

    let repo = GitRepo::discover(dir.path()).unwrap();
    let changes = repo.list_changes(DiffMode::Staged).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Renamed);
    assert_eq!(changes[0].path.as_str(), "moved.txt");
    assert_eq!(
        changes[0].old_path.as_ref().map(|p| p.as_str()),
        Some("file.txt")
    );
}

#[test]
fn entries_carry_kinds_without_stats() {
    let (dir, _raw) = create_test_repo();
    write(dir.path(), "file.txt", "changed\n");
    let repo = GitRepo::discover(dir.path()).unwrap();
    let entries = list_entries(&repo, DiffMode::Unstaged).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].change_kind, ChangeKind::Modified);
    assert_eq!((entries[0].lines_added, entries[0].lines_removed), (0, 0));
}

#[test]
fn branch_compare_includes_commits_and_worktree_edits() {
    let (dir, raw) = create_test_repo();
    let head = raw.head().unwrap().peel_to_commit().unwrap();
    raw.branch("topic", &head, false).unwrap();
    raw.set_head("refs/heads/topic").unwrap();

    write(dir.path(), "feature.rs", "pub fn feature() {}\n");
    commit_all(&raw, "add feature");
    write(dir.path(), "file.txt", "one\ntwo\nthree\nfour\n");

    let repo = GitRepo::discover(dir.path()).unwrap();
    assert_eq!(repo.current_branch_or_short_hash().unwrap(), "topic");
    assert_eq!(repo.default_branch_name(), "main");

    let commits = repo.commits_ahead_of_default().unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].summary, "add feature");
    assert_eq!(commits[0].short_hash.len(), 7);

    let snap = snapshot(&repo, &request(DiffMode::BranchCompare)).unwrap();
    let files: Vec<(&str, ChangeKind)> = snap
        .files
        .iter()
        .map(|f| (f.path.as_str(), f.change_kind))
        .collect();
    assert_eq!(
        files,
        vec![
            ("feature.rs", ChangeKind::Added),
            ("file.txt", ChangeKind::Modified),
        ]
    );
    assert_eq!(snap.commits.len(), 1);
}

#[test]
fn branch_compare_on_default_branch_has_no_commits() {
    let (dir, _raw) = create_test_repo();
    let repo = GitRepo::discover(dir.path()).unwrap();
    assert!(repo.commits_ahead_of_default().unwrap().is_empty());
    let snap = snapshot(&repo, &request(DiffMode::BranchCompare)).unwrap();
    assert!(snap.files.is_empty());
}

#[test]
fn unborn_head_reports_branch_and_untracked_files() {
    let (dir, _raw) = init_repo();
    write(dir.path(), "first.txt", "hello\n");

    let repo = GitRepo::discover(dir.path()).unwrap();
    assert_eq!(repo.current_branch_or_short_hash().unwrap(), "main");
    assert!(repo.commits_ahead_of_default().unwrap().is_empty());
    assert!(repo.list_changes(DiffMode::Staged).unwrap().is_empty());

    let snap = snapshot(&repo, &request(DiffMode::Unstaged)).unwrap();
    assert_eq!(snap.files.len(), 1);
    assert_eq!(snap.files[0].change_kind, ChangeKind::Added);
    assert_eq!(snap.files[0].lines_added, 1);
}

#[test]
fn detached_head_reports_short_hash() {
    let (dir, raw) = create_test_repo();
    let oid = raw.head().unwrap().target().unwrap();
    raw.set_head_detached(oid).unwrap();

    let repo = GitRepo::discover(dir.path()).unwrap();
    let label = repo.current_branch_or_short_hash().unwrap();
    assert_eq!(label, oid.to_string()[..7]);
}

#[test]
fn fingerprint_follows_content() {
    let (dir, _raw) = create_test_repo();
    write(dir.path(), "file.txt", "one\n2\nthree\n");
    let repo = GitRepo::discover(dir.path()).unwrap();

    let first = snapshot(&repo, &request(DiffMode::Unstaged)).unwrap();
    let again = snapshot(&repo, &request(DiffMode::Unstaged)).unwrap();
    assert_eq!(first.fingerprint, again.fingerprint);

    write(dir.path(), "file.txt", "one\n22\nthree\n");
    let edited = snapshot(&repo, &request(DiffMode::Unstaged)).unwrap();
    assert_ne!(first.fingerprint, edited.fingerprint);
}

#[test]
fn default_branch_falls_back_to_master_then_develop() {
    for branch in ["master", "develop"] {
        let (dir, raw) = init_repo_on(branch);
        write(dir.path(), "file.txt", "one\n");
        commit_all(&raw, "initial");

        let repo = GitRepo::discover(dir.path()).unwrap();
        assert_eq!(repo.default_branch_name(), branch);
    }
}

#[test]
fn default_branch_resolves_through_origin() {
    let (dir, raw) = init_repo_on("topic");
    write(dir.path(), "file.txt", "one\n");
    commit_all(&raw, "initial");
    let base = raw.head().unwrap().target().unwrap();
    raw.reference("refs/remotes/origin/develop", base, true, "fetch")
        .unwrap();

    write(dir.path(), "file.txt", "one\ntwo\n");
    commit_all(&raw, "second");

    let repo = GitRepo::discover(dir.path()).unwrap();
    assert_eq!(repo.default_branch_name(), "develop");
    let commits = repo.commits_ahead_of_default().unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].summary, "second");
}

#[test]
fn unrelated_history_stops_at_the_commit_cap() {
    let (dir, raw) = create_test_repo();
    let sig = Signature::now("Test", "test@test.com").unwrap();
    let empty = raw.treebuilder(None).unwrap().write().unwrap();
    let tree = raw.find_tree(empty).unwrap();

    // An orphan branch with no merge base against `main`.
    let mut parent = None;
    for i in 0..DIVERGED_COMMIT_CAP + 10 {
        let parents: Vec<_> = parent.iter().collect();
        let oid = raw
            .commit(
                Some("refs/heads/topic"),
                &sig,
                &sig,
                &format!("orphan {i}"),
                &tree,
                &parents,
            )
            .unwrap();
        parent = Some(raw.find_commit(oid).unwrap());
    }
    raw.set_head("refs/heads/topic").unwrap();

    let repo = GitRepo::discover(dir.path()).unwrap();
    assert_eq!(repo.default_branch_name(), "main");
    let commits = repo.commits_ahead_of_default().unwrap();
    assert_eq!(commits.len(), DIVERGED_COMMIT_CAP);
}

#[test]
fn oversized_file_is_skipped_by_the_snapshot() {
    let (dir, _raw) = create_test_repo();
    write(dir.path(), "file.txt", "one\nTWO\nthree\n");
    let big = vec![b'a'; MAX_FILE_SIZE as usize + 1];
    fs::write(dir.path().join("big.txt"), big).unwrap();

    let repo = GitRepo::discover(dir.path()).unwrap();
    let snap = snapshot(&repo, &request(DiffMode::Unstaged)).unwrap();
    let paths: Vec<&str> = snap.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["file.txt"]);
    assert_eq!(snap.skipped, 1);
}
