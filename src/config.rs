//! Optional user configuration at `<config dir>/hunkwatch/config.json`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{warn, Level};

use crate::core::DEFAULT_CONTEXT;

/// Context lines added or removed by `o`.
pub const CONTEXT_STEP: usize = 5;

/// Settings read at startup. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Theme name: a built-in or a file under `themes/`.
    pub theme: String,
    /// Initial context width in diff-only view.
    pub context_lines: usize,
    /// Step for `o`.
    pub context_step: usize,
    /// `error`, `warn`, `info`, `debug`, or `trace`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            context_lines: DEFAULT_CONTEXT,
            context_step: CONTEXT_STEP,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Read the user config file, falling back to defaults.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Read `path`; a missing file means defaults, a malformed one logs a warning.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => config.sanitized(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "malformed config, using defaults");
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        if self.context_step == 0 {
            self.context_step = CONTEXT_STEP;
        }
        self
    }

    /// Minimum level to log; unknown names mean INFO.
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hunkwatch").join("config.json"))
}
