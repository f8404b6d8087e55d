//! Core primitives for hunkwatch (no TUI dependencies).

mod assemble;
mod detector;
mod diff;
mod fingerprint;
mod repo;
mod text;
mod tree;
mod watcher;

pub use assemble::*;
pub use detector::*;
pub use diff::*;
pub use fingerprint::*;
pub use repo::*;
pub use text::*;
pub use tree::*;
pub use watcher::*;
