//! Line differ: turns two line sequences into structured hunks.

use std::collections::VecDeque;
use std::ops::Range;

use similar::{capture_diff_slices, Algorithm, DiffOp, DiffTag};
use thiserror::Error;

/// Default number of context lines kept around each hunk.
pub const DEFAULT_CONTEXT: usize = 5;

/// Context sentinel meaning "one hunk covering the whole file".
pub const UNLIMITED_CONTEXT: usize = usize::MAX;

/// Kind of a single line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Present on both sides.
    Context,
    /// Only in the new side.
    Added,
    /// Only in the old side.
    Removed,
}

impl LineKind {
    /// Unified-diff prefix character.
    pub fn prefix(self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Added => '+',
            LineKind::Removed => '-',
        }
    }
}

/// A line of a hunk. Line numbers are 1-based; 0 means "not on this side".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// What happened to the line.
    pub kind: LineKind,
    /// Line content without the trailing newline.
    pub content: String,
    /// Line number in the old side, or 0 for added lines.
    pub old_line_number: usize,
    /// Line number in the new side, or 0 for removed lines.
    pub new_line_number: usize,
}

/// A contiguous run of changes with bounded surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// First old line covered (0 when the old side is empty).
    pub old_start: usize,
    /// Number of old lines covered (non-added lines).
    pub old_count: usize,
    /// First new line covered (0 when the new side is empty).
    pub new_start: usize,
    /// Number of new lines covered (non-removed lines).
    pub new_count: usize,
    /// Lines in display order.
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Unified-diff style header, e.g. `@@ -3,4 +3,5 @@`.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }

    /// Number of added lines.
    pub fn added(&self) -> usize {
        self.count(LineKind::Added)
    }

    /// Number of removed lines.
    pub fn removed(&self) -> usize {
        self.count(LineKind::Removed)
    }

    fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// Structural failure while translating matcher spans into hunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// A span does not start where the previous one ended.
    #[error("{side} span starts at {start}, expected {expected}")]
    NonContiguousSpan {
        /// Which side (`old` or `new`).
        side: &'static str,
        /// Where the span starts.
        start: usize,
        /// Where it should have started.
        expected: usize,
    },
    /// A span reaches past the end of its input.
    #[error("{side} span ends at {end}, input has {len} lines")]
    SpanOutOfBounds {
        /// Which side (`old` or `new`).
        side: &'static str,
        /// Exclusive end of the span.
        end: usize,
        /// Number of lines available.
        len: usize,
    },
}

/// Compute hunks between two line sequences.
///
/// `context` is the number of unchanged lines kept after each change run;
/// leading context is trimmed so every hunk starts at its first change.
/// With [`UNLIMITED_CONTEXT`] a single hunk covering both files is emitted
/// whenever they differ.
///
/// # Examples
///
/// ```
/// use hunkwatch::core::{compute_hunks, LineKind};
///
/// let hunks = compute_hunks(&["a", "b", "c"], &["a", "B", "c"], 5).unwrap();
/// assert_eq!(hunks.len(), 1);
/// assert_eq!(hunks[0].old_start, 2);
/// assert_eq!(hunks[0].lines[0].kind, LineKind::Removed);
/// ```
pub fn compute_hunks<S: AsRef<str>>(
    old: &[S],
    new: &[S],
    context: usize,
) -> Result<Vec<Hunk>, DiffError> {
    let old: Vec<&str> = old.iter().map(AsRef::as_ref).collect();
    let new: Vec<&str> = new.iter().map(AsRef::as_ref).collect();
    let ops = capture_diff_slices(Algorithm::Myers, &old, &new);
    hunks_from_ops(&old, &new, &ops, context)
}

/// Translate matcher spans into hunks.
pub(crate) fn hunks_from_ops(
    old: &[&str],
    new: &[&str],
    ops: &[DiffOp],
    context: usize,
) -> Result<Vec<Hunk>, DiffError> {
    let mut builder = HunkBuilder::new(context);
    let mut old_cursor = 0usize;
    let mut new_cursor = 0usize;

    for op in ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        // A pure delete or insert only says where it sits on its own side;
        // the index it reports for the other side need not be in order.
        if tag != DiffTag::Insert {
            check_span("old", &old_range, old_cursor, old.len())?;
            old_cursor = old_range.end;
        }
        if tag != DiffTag::Delete {
            check_span("new", &new_range, new_cursor, new.len())?;
            new_cursor = new_range.end;
        }

        match tag {
            DiffTag::Equal => {
                for line in &old[old_range] {
                    builder.equal(line);
                }
            }
            DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                builder.change(&old[old_range], &new[new_range]);
            }
        }
    }

    // The matcher must cover both inputs completely.
    check_span("old", &(old.len()..old.len()), old_cursor, old.len())?;
    check_span("new", &(new.len()..new.len()), new_cursor, new.len())?;

    Ok(builder.finish())
}

fn check_span(
    side: &'static str,
    range: &Range<usize>,
    expected: usize,
    len: usize,
) -> Result<(), DiffError> {
    if range.start != expected {
        return Err(DiffError::NonContiguousSpan {
            side,
            start: range.start,
            expected,
        });
    }
    if range.end > len {
        return Err(DiffError::SpanOutOfBounds {
            side,
            end: range.end,
            len,
        });
    }
    Ok(())
}

/// A hunk under construction.
struct OpenHunk {
    /// Old line number of the first line in `lines`.
    old_start: usize,
    /// New line number of the first line in `lines`.
    new_start: usize,
    lines: Vec<DiffLine>,
    trailing_context: usize,
    has_change: bool,
}

impl OpenHunk {
    /// Trim trailing context beyond `keep` and drop leading context when asked.
    fn into_hunk(mut self, keep_trailing: usize, trim_leading: bool) -> Hunk {
        let excess = self.trailing_context.saturating_sub(keep_trailing);
        self.lines.truncate(self.lines.len() - excess);

        if trim_leading {
            let trim = self
                .lines
                .iter()
                .take_while(|l| l.kind == LineKind::Context)
                .count();
            self.lines.drain(..trim);
            self.old_start += trim;
            self.new_start += trim;
        }

        let old_count = self
            .lines
            .iter()
            .filter(|l| l.kind != LineKind::Added)
            .count();
        let new_count = self
            .lines
            .iter()
            .filter(|l| l.kind != LineKind::Removed)
            .count();

        // An empty side points at the line before the insertion point.
        Hunk {
            old_start: if old_count == 0 {
                self.old_start - 1
            } else {
                self.old_start
            },
            old_count,
            new_start: if new_count == 0 {
                self.new_start - 1
            } else {
                self.new_start
            },
            new_count,
            lines: self.lines,
        }
    }
}

struct HunkBuilder {
    context: usize,
    /// Next 1-based line number on each side.
    next_old: usize,
    next_new: usize,
    /// Last `context` equal lines seen outside a hunk.
    leading: VecDeque<DiffLine>,
    current: Option<OpenHunk>,
    done: Vec<Hunk>,
}

impl HunkBuilder {
    fn new(context: usize) -> Self {
        Self {
            context,
            next_old: 1,
            next_new: 1,
            leading: VecDeque::new(),
            current: None,
            done: Vec::new(),
        }
    }

    fn unlimited(&self) -> bool {
        self.context == UNLIMITED_CONTEXT
    }

    fn equal(&mut self, content: &str) {
        let line = DiffLine {
            kind: LineKind::Context,
            content: content.to_string(),
            old_line_number: self.next_old,
            new_line_number: self.next_new,
        };
        self.next_old += 1;
        self.next_new += 1;

        if let Some(open) = self.current.as_mut() {
            open.lines.push(line);
            open.trailing_context += 1;
            if open.has_change && open.trailing_context >= self.context {
                self.close();
            }
            return;
        }

        if self.context == 0 {
            return;
        }
        self.leading.push_back(line);
        if self.leading.len() > self.context {
            self.leading.pop_front();
        }
    }

    /// Removed lines first, then added lines.
    fn change(&mut self, removed: &[&str], added: &[&str]) {
        let open = match self.current.as_mut() {
            Some(open) => open,
            None => {
                let lines: Vec<DiffLine> = self.leading.drain(..).collect();
                self.current.insert(OpenHunk {
                    old_start: self.next_old - lines.len(),
                    new_start: self.next_new - lines.len(),
                    lines,
                    trailing_context: 0,
                    has_change: false,
                })
            }
        };

        for content in removed {
            open.lines.push(DiffLine {
                kind: LineKind::Removed,
                content: (*content).to_string(),
                old_line_number: self.next_old,
                new_line_number: 0,
            });
            self.next_old += 1;
        }
        for content in added {
            open.lines.push(DiffLine {
                kind: LineKind::Added,
                content: (*content).to_string(),
                old_line_number: 0,
                new_line_number: self.next_new,
            });
            self.next_new += 1;
        }
        open.trailing_context = 0;
        open.has_change = open.has_change || !removed.is_empty() || !added.is_empty();
    }

    fn close(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        if !open.has_change {
            return;
        }
        let unlimited = self.unlimited();
        self.done.push(open.into_hunk(self.context, !unlimited));
    }

    fn finish(mut self) -> Vec<Hunk> {
        self.close();
        self.done
    }
}
