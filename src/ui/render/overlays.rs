//! Help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::app::App;

const BINDINGS: [(&str, &str); 18] = [
    ("j / ↓", "select next file, or next hunk in the diff panel"),
    ("k / ↑", "select previous file, or previous hunk in the diff panel"),
    ("↑ / ↓ (diff)", "scroll one line"),
    ("PgUp / PgDn", "page up / down"),
    ("gg / G", "top / bottom of the diff"),
    ("Tab", "switch panel (not in whole-file view)"),
    ("Enter / Space", "fold directory, or refresh the selected file"),
    ("s", "cycle mode: unstaged, staged, branch"),
    ("f", "toggle diff-only / whole-file view"),
    ("o", "widen context"),
    ("O", "reset context"),
    ("/", "search files"),
    ("Enter (search)", "keep the query"),
    ("Esc (search)", "clear the query"),
    ("r", "reload now"),
    ("Esc", "dismiss the error"),
    ("?", "toggle this help"),
    ("q / Ctrl+C", "quit"),
];

/// Centered list of every binding.
pub fn render_help_overlay(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = frame.area();
    let width = 72.min(area.width.saturating_sub(2).max(1));
    let height = (BINDINGS.len() as u16 + 4).min(area.height.saturating_sub(2).max(1));
    let overlay = Rect::new(
        area.width.saturating_sub(width) / 2,
        area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(theme.bg_bar));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    if inner.height == 0 {
        return;
    }

    let mut lines = vec![
        Line::from(Span::styled(
            "Press ? to close.",
            Style::default().fg(theme.text_muted),
        )),
        Line::default(),
    ];
    lines.extend(BINDINGS.iter().map(|(key, desc)| {
        Line::from(vec![
            Span::styled(format!(" {key:<16}"), Style::default().fg(theme.accent)),
            Span::styled(*desc, Style::default().fg(theme.text)),
        ])
    }));
    frame.render_widget(Paragraph::new(lines), inner);
}
