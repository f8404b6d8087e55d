//! hunkwatch - a live-reloading terminal reviewer for git changes.
//!
//! Shows unstaged, staged, or branch-vs-default-branch changes as a file
//! tree beside their hunks, and reloads when the worktree or repository
//! state changes on disk.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hunkwatch::prelude::*;
//!
//! let repo = GitRepo::open_at_current_dir()?;
//! let request = DiffRequest { mode: DiffMode::Unstaged, view_mode: ViewMode::DiffOnly, context: 5 };
//! let snap = hunkwatch::core::snapshot(&repo, &request)?;
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod core;
pub mod logging;
pub mod prelude;
pub mod theme;
pub mod ui;
