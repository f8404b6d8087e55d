//! Header and footer bars.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::core::{DiffMode, ViewMode};
use crate::ui::app::{App, Panel};

use super::helpers::{pad_line, stats_label};

/// Two rows: what is compared, then where.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bar = Style::default().bg(theme.bg_bar);
    let label = Style::default().fg(theme.text_muted).bg(theme.bg_bar);
    let value = Style::default()
        .fg(theme.text_bright)
        .bg(theme.bg_bar)
        .add_modifier(Modifier::BOLD);

    let context = match app.viewer.view_mode {
        ViewMode::DiffOnly => app.viewer.context.to_string(),
        ViewMode::WholeFile => "all".to_string(),
    };
    let (added, removed) = app
        .files
        .iter()
        .fold((0, 0), |(a, r), f| (a + f.lines_added, r + f.lines_removed));

    let first = vec![
        Span::styled(" hunkwatch ", Style::default().fg(theme.accent).bg(theme.bg_bar)),
        Span::styled(" mode ", label),
        Span::styled(app.mode.label(), value),
        Span::styled("  view ", label),
        Span::styled(app.viewer.view_mode.label(), value),
        Span::styled("  context ", label),
        Span::styled(context, value),
        Span::styled(format!("  {} files ", app.files.len()), label),
        Span::styled(
            stats_label(added, removed),
            Style::default().fg(theme.added).bg(theme.bg_bar),
        ),
    ];

    let mut second = vec![
        Span::styled(" ", bar),
        Span::styled(
            if app.branch.is_empty() { "…".to_string() } else { app.branch.clone() },
            Style::default().fg(theme.accent).bg(theme.bg_bar),
        ),
        Span::styled(" in ", label),
        Span::styled(app.root.clone(), Style::default().fg(theme.text).bg(theme.bg_bar)),
    ];
    if app.mode == DiffMode::BranchCompare {
        second.push(Span::styled("  vs ", label));
        second.push(Span::styled(app.default_branch.clone(), value));
        second.push(Span::styled(
            format!("  {} commits ahead", app.commits.len()),
            label,
        ));
    }

    let width = area.width as usize;
    let lines = vec![
        Line::from(pad_line(first, width, theme.bg_bar)),
        Line::from(pad_line(second, width, theme.bg_bar)),
    ];
    frame.render_widget(Paragraph::new(lines).style(bar), area);
}

/// Search prompt, else error, else status, else key hints.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bar = Style::default().bg(theme.bg_bar);

    let spans = if app.sidebar.search_mode {
        vec![
            Span::styled(" Search: ", Style::default().fg(theme.accent).bg(theme.bg_bar)),
            Span::styled(
                app.sidebar.query.clone(),
                Style::default().fg(theme.text_bright).bg(theme.bg_bar),
            ),
            Span::styled("█", Style::default().fg(theme.accent).bg(theme.bg_bar)),
            Span::styled(
                format!("  {} rows  Enter: keep  Esc: clear", app.rows.len()),
                Style::default().fg(theme.text_muted).bg(theme.bg_bar),
            ),
        ]
    } else if let Some(err) = &app.ui.error {
        vec![
            Span::styled(" ✗ ", Style::default().fg(theme.error).bg(theme.bg_bar)),
            Span::styled(err.clone(), Style::default().fg(theme.error).bg(theme.bg_bar)),
            Span::styled("  Esc: dismiss", Style::default().fg(theme.text_muted).bg(theme.bg_bar)),
        ]
    } else if let Some(status) = &app.ui.status {
        vec![
            Span::styled(" ", bar),
            Span::styled(status.clone(), Style::default().fg(theme.warning).bg(theme.bg_bar)),
        ]
    } else {
        hint_spans(app)
    };

    let line = Line::from(pad_line(spans, area.width as usize, theme.bg_bar));
    frame.render_widget(Paragraph::new(line).style(bar), area);
}

fn hint_spans(app: &App) -> Vec<Span<'static>> {
    let theme = &app.theme;
    let hints: &[(&str, &str)] = match (app.viewer.view_mode, app.panel) {
        (ViewMode::WholeFile, _) => &[("j/k", "scroll"), ("PgUp/PgDn", "page"), ("gg/G", "top/bottom")],
        (ViewMode::DiffOnly, Panel::FileTree) => &[
            ("j/k", "select"),
            ("↵", "open/fold"),
            ("/", "search"),
            ("⇥", "diff"),
            ("o/O", "context"),
        ],
        (ViewMode::DiffOnly, Panel::Diff) => &[
            ("j/k", "hunks"),
            ("↑/↓", "scroll"),
            ("gg/G", "top/bottom"),
            ("⇥", "files"),
            ("o/O", "context"),
        ],
    };

    let mut spans = vec![Span::styled(" ", Style::default().bg(theme.bg_bar))];
    let common = [("s", "mode"), ("f", "view"), ("?", "help"), ("q", "quit")];
    for (i, (key, desc)) in hints.iter().chain(common.iter()).enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", Style::default().bg(theme.bg_bar)));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default().fg(theme.accent).bg(theme.bg_bar),
        ));
        spans.push(Span::styled(
            format!(" {desc}"),
            Style::default().fg(theme.text_muted).bg(theme.bg_bar),
        ));
    }
    spans
}
