//! Drawing with ratatui.
//!
//! Layout: two-row header, sidebar tree beside the diff panel, one-row footer.

mod bars;
mod diff;
mod helpers;
mod overlays;
mod sidebar;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
    Frame,
};

use super::app::App;

pub use helpers::{display_text, stats_label, truncate_path, truncate_str, SIDEBAR_WIDTH};

/// Header rows above the panels.
pub const HEADER_ROWS: u16 = 2;

/// Draw the whole screen.
pub fn render(frame: &mut Frame, app: &App) {
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.bg)),
        frame.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_ROWS),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    bars::render_header(frame, app, chunks[0]);
    render_main(frame, app, chunks[1]);
    bars::render_footer(frame, app, chunks[2]);

    if app.ui.show_help {
        overlays::render_help_overlay(frame, app);
    }
}

fn render_main(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(area);

    sidebar::render_sidebar(frame, app, chunks[0]);
    diff::render_diff(frame, app, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::{
        compute_hunks, ChangeKind, DiffMode, FileDiff, FileEntry, Fingerprint, RelPath,
    };
    use crate::theme::Theme;
    use crate::ui::app::Msg;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App) -> String {
        let backend = TestBackend::new(100, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn app() -> App {
        let mut app = App::new(&Config::default(), Theme::default());
        app.update(Msg::WindowResized {
            width: 100,
            height: 20,
        });
        app.update(Msg::GitInfoLoaded {
            root: "/work/repo".into(),
            branch: "topic".into(),
            default_branch: "main".into(),
        });
        let diff = FileDiff::new(
            RelPath::new("src/lib.rs"),
            ChangeKind::Modified,
            compute_hunks(&["a", "b", "c"], &["a", "B", "c"], 5).unwrap(),
        );
        app.update(Msg::FilesLoaded {
            mode: DiffMode::Unstaged,
            files: vec![FileEntry::new(RelPath::new("src/lib.rs"), ChangeKind::Modified)],
            fingerprint: Fingerprint(1),
        });
        let request = app.diff_request();
        app.update(Msg::DiffsLoaded {
            request,
            files: vec![diff],
            fingerprint: Fingerprint(2),
            skipped: 0,
        });
        app
    }

    #[test]
    fn draws_header_tree_and_hunks() {
        let mut app = app();
        // Select the file row under `src`.
        app.move_selection(1);
        let text = screen(&app);
        assert!(text.contains("unstaged"), "{text}");
        assert!(text.contains("topic"), "{text}");
        assert!(text.contains("lib.rs"), "{text}");
        assert!(text.contains("@@ -2,2 +2,2 @@"), "{text}");
        assert!(text.contains("-b"), "{text}");
        assert!(text.contains("+B"), "{text}");
    }

    #[test]
    fn footer_prefers_error_over_hints() {
        let mut app = app();
        app.update(Msg::Error("listing changes: boom".into()));
        assert!(screen(&app).contains("listing changes: boom"));
    }

    #[test]
    fn help_overlay_lists_bindings() {
        let mut app = app();
        app.update(Msg::ShowHelp);
        let text = screen(&app);
        assert!(text.contains("Help"));
        assert!(text.contains("cycle mode"));
    }
}
