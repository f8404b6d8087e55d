//! Sidebar file tree.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::app::{App, Panel};

use super::helpers::{kind_color, pad_line, stats_label, truncate_path};

/// Render the visible tree rows.
pub fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let focused = app.panel == Panel::FileTree;
    let border = if focused { theme.border_focus } else { theme.border };

    let title = if app.sidebar.query.is_empty() {
        format!(" Files ({}) ", app.files.len())
    } else {
        format!(" Files [{}] ", app.sidebar.query)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            title,
            Style::default().fg(if focused { theme.accent } else { theme.text_muted }),
        ))
        .style(Style::default().bg(theme.bg_panel));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let height = inner.height as usize;
    if height == 0 {
        return;
    }

    if app.rows.is_empty() {
        let msg = if app.files.is_empty() { "No changes" } else { "No matches" };
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(theme.text_muted).bg(theme.bg_panel)),
            inner,
        );
        return;
    }

    let width = inner.width as usize;
    let lines: Vec<Line> = app
        .rows
        .iter()
        .enumerate()
        .skip(app.sidebar.scroll)
        .take(height)
        .map(|(idx, row)| {
            let selected = idx == app.sidebar.selected_idx;
            let bg = if selected { theme.bg_selected } else { theme.bg_panel };

            let marker = if selected { "▌" } else { " " };
            let indent = "  ".repeat(row.depth);
            let icon = match (row.is_directory, row.is_expanded) {
                (true, true) => "▾ ",
                (true, false) => "▸ ",
                (false, _) => "",
            };
            let stats = stats_label(row.lines_added, row.lines_removed);
            let fixed = 1 + indent.chars().count() + icon.chars().count() + 2 + stats.len() + 1;
            let name = truncate_path(&row.name, width.saturating_sub(fixed));

            let mut name_style = Style::default().bg(bg).fg(if selected {
                theme.text_bright
            } else {
                theme.text
            });
            if row.is_directory {
                name_style = name_style.add_modifier(Modifier::BOLD);
            }

            let mut spans = vec![
                Span::styled(marker, Style::default().fg(theme.accent).bg(bg)),
                Span::styled(indent, Style::default().bg(bg)),
                Span::styled(icon, Style::default().fg(theme.text_muted).bg(bg)),
                Span::styled(
                    format!("{} ", row.change_kind.tag()),
                    Style::default().fg(kind_color(row.change_kind, theme)).bg(bg),
                ),
                Span::styled(name, name_style),
            ];
            if !stats.is_empty() {
                let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
                let gap = width.saturating_sub(used + stats.len()).max(1);
                spans.push(Span::styled(" ".repeat(gap), Style::default().bg(bg)));
                spans.push(Span::styled(stats, Style::default().fg(theme.text_muted).bg(bg)));
            }
            Line::from(pad_line(spans, width, bg))
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(theme.bg_panel)),
        inner,
    );
}
