//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Command, Panel};
use crate::core::ViewMode;

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Apply a key press to the session.
pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    if app.sidebar.search_mode {
        handle_search_key(app, key);
        return None;
    }

    if is_ctrl_c(&key) || key.code == KeyCode::Char('q') {
        app.should_quit = true;
        return Some(Command::Quit);
    }

    if app.ui.show_help {
        if key.code == KeyCode::Char('?') {
            app.ui.show_help = false;
        }
        return None;
    }

    // Any non-`g` key disarms `gg`.
    if key.code == KeyCode::Char('g') {
        if app.ui.pending_g {
            app.ui.pending_g = false;
            if app.diff_has_cursor() {
                app.scroll_top();
            }
        } else {
            app.ui.pending_g = true;
        }
        return None;
    }
    app.ui.pending_g = false;

    match key.code {
        KeyCode::Char('?') => {
            app.ui.show_help = true;
            None
        }
        KeyCode::Esc => {
            app.ui.error = None;
            None
        }
        KeyCode::Char('r') => Some(app.reload()),
        KeyCode::Char('s') => Some(app.cycle_mode()),
        KeyCode::Char('f') => Some(app.toggle_view_mode()),
        KeyCode::Char('o') => app.widen_context(),
        KeyCode::Char('O') => app.reset_context(),
        KeyCode::Tab => {
            app.toggle_panel();
            None
        }
        KeyCode::Char('G') => {
            if app.diff_has_cursor() {
                app.scroll_bottom();
            }
            None
        }
        KeyCode::Char('/') => {
            if app.panel == Panel::FileTree && app.viewer.view_mode == ViewMode::DiffOnly {
                app.start_search();
            }
            None
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if app.panel == Panel::FileTree && app.viewer.view_mode == ViewMode::DiffOnly {
                app.activate_selection()
            } else {
                None
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            move_vertical(app, key.code, -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_vertical(app, key.code, 1);
            None
        }
        KeyCode::PageUp => {
            page(app, -1);
            None
        }
        KeyCode::PageDown => {
            page(app, 1);
            None
        }
        _ => None,
    }
}

fn move_vertical(app: &mut App, code: KeyCode, dir: isize) {
    if !app.diff_has_cursor() {
        app.move_selection(dir);
        return;
    }
    let hunk_jump = app.viewer.view_mode == ViewMode::DiffOnly
        && matches!(code, KeyCode::Char('j') | KeyCode::Char('k'));
    match (hunk_jump, dir > 0) {
        (true, true) => app.jump_next_hunk(),
        (true, false) => app.jump_prev_hunk(),
        (false, _) => app.scroll_diff(dir),
    }
}

fn page(app: &mut App, dir: isize) {
    let step = app.visible_rows() as isize * dir;
    if app.diff_has_cursor() {
        app.scroll_diff(step);
    } else {
        app.move_selection(step);
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    if is_ctrl_c(&key) {
        app.cancel_search();
        return;
    }
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.accept_search(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
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

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) -> Option<Command> {
        app.update(Msg::KeyPressed(key(code)))
    }

    fn app() -> App {
        let mut app = App::new(&Config::default(), Theme::default());
        app.update(Msg::WindowResized {
            width: 100,
            height: 12,
        });
        let old: Vec<String> = (0..60).map(|i| format!("{i}")).collect();
        let mut new = old.clone();
        new[10] = "ten".into();
        new[40] = "forty".into();
        let diff = FileDiff::new(
            RelPath::new("a.rs"),
            ChangeKind::Modified,
            compute_hunks(&old, &new, 5).unwrap(),
        );
        app.update(Msg::FilesLoaded {
            mode: DiffMode::Unstaged,
            files: vec![
                FileEntry::new(RelPath::new("a.rs"), ChangeKind::Modified),
                FileEntry::new(RelPath::new("b.rs"), ChangeKind::Added),
            ],
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
    fn quit_from_any_normal_state() {
        let mut a = app();
        assert_eq!(press(&mut a, KeyCode::Char('q')), Some(Command::Quit));
        assert!(a.should_quit);

        let mut b = app();
        b.ui.show_help = true;
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(b.update(Msg::KeyPressed(ctrl_c)), Some(Command::Quit));
    }

    #[test]
    fn help_swallows_other_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.ui.show_help);
        assert_eq!(press(&mut app, KeyCode::Char('s')), None);
        assert_eq!(app.mode, DiffMode::Unstaged);
        press(&mut app, KeyCode::Char('?'));
        assert!(!app.ui.show_help);
    }

    #[test]
    fn gg_needs_diff_cursor_and_is_disarmed_by_other_keys() {
        let mut app = app();
        app.panel = Panel::Diff;
        app.viewer.scroll = 4;
        press(&mut app, KeyCode::Char('g'));
        assert!(app.ui.pending_g);
        press(&mut app, KeyCode::Char('x'));
        assert!(!app.ui.pending_g);
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.viewer.scroll, 0);

        app.panel = Panel::FileTree;
        app.viewer.scroll = 4;
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.viewer.scroll, 4);
    }

    #[test]
    fn j_jumps_hunks_in_diff_panel_and_arrows_scroll() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.panel, Panel::Diff);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.viewer.scroll, 1);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.viewer.scroll, 2);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.viewer.scroll, 1);
    }

    #[test]
    fn arrows_move_tree_selection_in_sidebar() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        assert_eq!(app.sidebar.selected_idx, 1);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.sidebar.selected_idx, 0);
    }

    #[test]
    fn search_mode_captures_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert!(app.sidebar.search_mode);
        assert_eq!(press(&mut app, KeyCode::Char('q')), None);
        assert!(!app.should_quit);
        assert_eq!(app.sidebar.query, "q");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Enter);
        assert!(!app.sidebar.search_mode);
        assert_eq!(app.rows.len(), 1);
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert!(app.sidebar.query.is_empty());
        assert_eq!(app.rows.len(), 2);
    }

    #[test]
    fn esc_clears_error_and_r_reloads() {
        let mut app = app();
        app.update(Msg::Error("boom".into()));
        press(&mut app, KeyCode::Esc);
        assert!(app.ui.error.is_none());
        assert_eq!(press(&mut app, KeyCode::Char('r')), Some(app.reload()));
    }

    #[test]
    fn search_is_unavailable_in_whole_file() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.viewer.view_mode, ViewMode::WholeFile);
        press(&mut app, KeyCode::Char('/'));
        assert!(!app.sidebar.search_mode);
    }
}
