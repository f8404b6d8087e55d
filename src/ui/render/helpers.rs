//! Shared rendering helpers and constants.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

use crate::core::ChangeKind;
use crate::theme::Theme;

/// Sidebar width in columns, borders included.
pub const SIDEBAR_WIDTH: u16 = 36;

/// Tab stop width for display alignment.
pub const TAB_WIDTH: usize = 4;

/// Columns for one line number in the gutter.
pub const LINE_NUMBER_WIDTH: usize = 5;

/// Color for a change-kind badge.
pub fn kind_color(kind: ChangeKind, theme: &Theme) -> Color {
    match kind {
        ChangeKind::Added => theme.added,
        ChangeKind::Modified => theme.warning,
        ChangeKind::Deleted => theme.removed,
        ChangeKind::Renamed => theme.renamed,
    }
}

/// Replace control characters so they cannot move the cursor.
pub fn sanitize_char(c: char) -> char {
    match c {
        '\x00'..='\x08' | '\x0a'..='\x1f' | '\x7f' => '\u{FFFD}',
        _ => c,
    }
}

/// Expand tabs to the next tab stop and sanitize the rest.
pub fn display_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut col = 0;
    for c in s.chars() {
        if c == '\t' {
            let width = TAB_WIDTH - col % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(width));
            col += width;
        } else {
            out.push(sanitize_char(c));
            col += 1;
        }
    }
    out
}

/// Cut `s` to `max_len` characters, marking the cut with `…`.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len == 0 {
        String::new()
    } else {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{truncated}…")
    }
}

/// Cut a path from the left so its file name stays visible.
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let char_count = path.chars().count();
    if char_count <= max_len {
        path.to_string()
    } else if max_len == 0 {
        String::new()
    } else {
        let skip = char_count - max_len + 1;
        let tail: String = path.chars().skip(skip).collect();
        format!("…{tail}")
    }
}

/// Spans padded with `bg` up to `width` columns.
pub fn pad_line(mut spans: Vec<Span<'static>>, width: usize, bg: Color) -> Vec<Span<'static>> {
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(bg)));
    }
    spans
}

/// `+added -removed`, omitting zero sides.
pub fn stats_label(added: usize, removed: usize) -> String {
    match (added, removed) {
        (0, 0) => String::new(),
        (a, 0) => format!("+{a}"),
        (0, r) => format!("-{r}"),
        (a, r) => format!("+{a} -{r}"),
    }
}
