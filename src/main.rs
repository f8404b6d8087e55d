//! hunkwatch - a live-reloading terminal reviewer for git changes.

use std::io::{self, Write};
use std::panic;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{error, info};

use hunkwatch::config::Config;
use hunkwatch::core::{ChangeDetector, GitRepo, RepoAdapter, RepoWatcher, WatchError, Watcher};
use hunkwatch::logging;
use hunkwatch::theme::Theme;
use hunkwatch::ui::{render, App, Msg, Runtime};

/// Terminal input poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A live-reloading terminal reviewer for git changes.
#[derive(Parser, Debug)]
#[command(name = "hunkwatch", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Ignored except for `help`, `-h`, `--help`, and `diff help`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    rest: Vec<String>,
}

impl Cli {
    fn wants_help(&self) -> bool {
        let args: Vec<&str> = self.rest.iter().map(String::as_str).collect();
        matches!(
            args.as_slice(),
            ["help"] | ["-h"] | ["--help"] | ["diff", "help"]
        )
    }
}

/// Restores the terminal on drop, including during unwinding.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    let _ = disable_raw_mode();
    let _ = io::stdout().flush();
}

/// Stand-in when the filesystem watcher cannot start: live reload is off.
struct NoWatcher;

impl Watcher for NoWatcher {
    fn wait_for_change(&self) -> Result<(), WatchError> {
        Err(WatchError::Closed)
    }
    fn close(&self) {}
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.wants_help() {
        println!("hunkwatch {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let repo = match GitRepo::open_at_current_dir() {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    match run(repo) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(repo: GitRepo) -> Result<()> {
    let config = Config::load();
    let root = repo.root_path().to_path_buf();
    let log_path = logging::init(&root, config.level());
    info!(root = %root.display(), "starting");

    let (watcher, watch_error) = start_watcher(&root, repo.git_dir(), log_path.into_iter().collect());
    let detector = ChangeDetector::new(
        watcher.clone(),
        Box::new(GitRepo::open(&root).context("Failed to reopen repository")?),
    );
    let mut runtime = Runtime::spawn(Box::new(repo), detector, watcher);

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    let _guard = TerminalGuard::new().context("Failed to set up terminal")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(&config, Theme::load(&config.theme));
    let size = terminal.size()?;
    app.update(Msg::WindowResized {
        width: size.width,
        height: size.height,
    });
    if let Some(message) = watch_error {
        app.update(Msg::Error(message));
    }
    runtime.dispatch(app.init());

    let result = run_loop(&mut terminal, &mut app, &mut runtime);
    runtime.shutdown();
    let counts = logging::counts();
    info!(errors = counts.error, warnings = counts.warn, "exiting");
    result
}

fn start_watcher(
    root: &Path,
    git_dir: &Path,
    ignored: Vec<std::path::PathBuf>,
) -> (Arc<dyn Watcher>, Option<String>) {
    match RepoWatcher::new(root, git_dir, ignored) {
        Ok(watcher) => (Arc::new(watcher), None),
        Err(e) => {
            error!(error = %e, "filesystem watcher unavailable");
            (Arc::new(NoWatcher), Some(format!("live reload off: {e}")))
        }
    }
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, runtime: &mut Runtime) -> Result<()> {
    loop {
        while let Some(msg) = runtime.try_recv() {
            if let Some(cmd) = app.update(msg) {
                if runtime.dispatch(cmd) {
                    return Ok(());
                }
            }
        }

        if app.ui.dirty {
            terminal.draw(|frame| render(frame, app))?;
            app.clear_dirty();
        }

        if event::poll(POLL_INTERVAL)? {
            let msg = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => Some(Msg::KeyPressed(key)),
                Event::Resize(width, height) => Some(Msg::WindowResized { width, height }),
                _ => None,
            };
            if let Some(cmd) = msg.and_then(|msg| app.update(msg)) {
                if runtime.dispatch(cmd) {
                    return Ok(());
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
