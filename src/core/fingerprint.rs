//! Content fingerprint over assembled diffs.

use std::fmt;

use super::assemble::{FileDiff, FileEntry};
use super::diff::LineKind;
use super::repo::CommitSummary;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// 64-bit FNV-1a digest. Displays as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Self(FNV_OFFSET)
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn num(&mut self, n: usize) {
        self.bytes(&(n as u64).to_le_bytes());
    }

    fn field(&mut self, s: &str) {
        self.bytes(s.as_bytes());
        self.bytes(b"\0");
    }

    fn finish(self) -> Fingerprint {
        Fingerprint(self.0)
    }
}

fn line_tag(kind: LineKind) -> u8 {
    match kind {
        LineKind::Context => b' ',
        LineKind::Added => b'+',
        LineKind::Removed => b'-',
    }
}

fn entry_key(e: &FileEntry) -> (&str, super::repo::ChangeKind, usize, usize) {
    (e.path.as_str(), e.change_kind, e.lines_added, e.lines_removed)
}

fn feed_entry(h: &mut Fnv, e: &FileEntry) {
    h.field(e.path.as_str());
    h.bytes(&[e.change_kind.tag() as u8]);
    h.num(e.lines_added);
    h.num(e.lines_removed);
}

/// Fingerprint diffs plus, in branch mode, the commit hashes in walk order.
///
/// Independent of the order `files` arrive in.
pub fn fingerprint_files(files: &[FileDiff], commits: &[CommitSummary]) -> Fingerprint {
    let mut sorted: Vec<(FileEntry, &FileDiff)> = files.iter().map(|f| (f.summary(), f)).collect();
    sorted.sort_by(|a, b| entry_key(&a.0).cmp(&entry_key(&b.0)));

    let mut h = Fnv::new();
    for (entry, file) in &sorted {
        feed_entry(&mut h, entry);
        for hunk in &file.hunks {
            h.num(hunk.old_start);
            h.num(hunk.old_count);
            h.num(hunk.new_start);
            h.num(hunk.new_count);
            for line in &hunk.lines {
                h.bytes(&[line_tag(line.kind)]);
                h.field(&line.content);
            }
        }
    }
    for commit in commits {
        h.field(&commit.hash);
    }
    h.finish()
}

/// Fingerprint path-plus-stats records only.
pub fn fingerprint_entries(entries: &[FileEntry]) -> Fingerprint {
    let mut sorted: Vec<&FileEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| entry_key(a).cmp(&entry_key(b)));

    let mut h = Fnv::new();
    for entry in sorted {
        feed_entry(&mut h, entry);
    }
    h.finish()
}
