//! Diff panel: branch header, file headers, hunks.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::{ChangeKind, DiffLine, FileDiff, LineKind};
use crate::theme::Theme;
use crate::ui::app::{App, DiffRow, Panel};

use super::helpers::{
    display_text, kind_color, pad_line, stats_label, truncate_str, LINE_NUMBER_WIDTH,
};

/// Render the rows for the current selection from `viewer.scroll`.
pub fn render_diff(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let focused = app.panel == Panel::Diff;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { theme.border_focus } else { theme.border }))
        .title(Span::styled(
            format!(" Diff · {} ", app.viewer.view_mode.label()),
            Style::default().fg(if focused { theme.accent } else { theme.text_muted }),
        ))
        .style(Style::default().bg(theme.bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = app.diff_rows();
    if rows.is_empty() {
        let msg = if app.files.is_empty() {
            "No changes"
        } else {
            "Select a file"
        };
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(theme.text_muted)),
            inner,
        );
        return;
    }

    let width = inner.width as usize;
    let lines: Vec<Line> = rows
        .iter()
        .skip(app.viewer.scroll)
        .take(inner.height as usize)
        .map(|row| render_row(app, *row, width))
        .collect();
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(theme.bg)), inner);
}

fn render_row(app: &App, row: DiffRow<'_>, width: usize) -> Line<'static> {
    let theme = &app.theme;
    match row {
        DiffRow::BranchSummary => {
            let text = format!(
                " {} vs {} · {} files · {} commits ahead",
                app.branch,
                app.default_branch,
                app.files.len(),
                app.commits.len()
            );
            Line::from(Span::styled(
                truncate_str(&text, width),
                Style::default()
                    .fg(theme.text_bright)
                    .add_modifier(Modifier::BOLD),
            ))
        }
        DiffRow::BranchLatestCommit => match app.commits.first() {
            Some(commit) => {
                let text = format!(
                    " {} {} · {} · {}",
                    commit.short_hash, commit.summary, commit.author, commit.date
                );
                Line::from(Span::styled(
                    truncate_str(&text, width),
                    Style::default().fg(theme.text_muted),
                ))
            }
            None => Line::default(),
        },
        DiffRow::Separator => Line::default(),
        DiffRow::FileHeader(file) => file_header(file, theme, width),
        DiffRow::HunkHeader(hunk) => Line::from(Span::styled(
            format!(" {}", hunk.header()),
            Style::default().fg(theme.hunk_header),
        )),
        DiffRow::Line(line) => diff_line(line, theme, width),
    }
}

fn file_header(file: &FileDiff, theme: &Theme, width: usize) -> Line<'static> {
    let kind = match file.change_kind {
        ChangeKind::Added => "added",
        ChangeKind::Modified => "modified",
        ChangeKind::Deleted => "deleted",
        ChangeKind::Renamed => "renamed",
    };
    let spans = vec![
        Span::styled(
            format!(" {} ", file.change_kind.tag()),
            Style::default()
                .fg(kind_color(file.change_kind, theme))
                .bg(theme.bg_bar)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            file.path.to_string(),
            Style::default()
                .fg(theme.text_bright)
                .bg(theme.bg_bar)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {kind}  "),
            Style::default().fg(theme.text_muted).bg(theme.bg_bar),
        ),
        Span::styled(
            stats_label(file.lines_added, file.lines_removed),
            Style::default().fg(theme.text).bg(theme.bg_bar),
        ),
    ];
    Line::from(pad_line(spans, width, theme.bg_bar))
}

fn line_number(n: usize) -> String {
    if n == 0 {
        " ".repeat(LINE_NUMBER_WIDTH)
    } else {
        format!("{n:>w$}", w = LINE_NUMBER_WIDTH)
    }
}

fn diff_line(line: &DiffLine, theme: &Theme, width: usize) -> Line<'static> {
    let (fg, bg) = match line.kind {
        LineKind::Context => (theme.text, theme.bg),
        LineKind::Added => (theme.added, theme.added_bg),
        LineKind::Removed => (theme.removed, theme.removed_bg),
    };
    let gutter = format!(
        "{} {} │",
        line_number(line.old_line_number),
        line_number(line.new_line_number)
    );
    let gutter_width = gutter.chars().count();
    let body = format!("{}{}", line.kind.prefix(), display_text(&line.content));
    let spans = vec![
        Span::styled(gutter, Style::default().fg(theme.text_muted).bg(theme.bg)),
        Span::styled(
            truncate_str(&body, width.saturating_sub(gutter_width)),
            Style::default().fg(fg).bg(bg),
        ),
    ];
    Line::from(pad_line(spans, width, bg))
}
