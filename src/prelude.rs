//! Common re-exports for convenient importing.
//!
//! # Example
//!
//! ```rust,ignore
//! use hunkwatch::prelude::*;
//! ```

pub use crate::core::{
    compute_hunks, ChangeKind, DiffMode, DiffRequest, FileDiff, Fingerprint, GitRepo, Hunk,
    RelPath, RepoAdapter, RepoError, ViewMode,
};
