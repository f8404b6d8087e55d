//! Color palettes: built-ins plus user JSON themes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

/// Built-in palette names.
pub const BUILTIN_THEMES: [&str; 4] = ["default", "dracula", "nord", "gruvbox"];

/// Every color the UI draws with.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Theme {
    // Backgrounds
    pub bg: Color,
    pub bg_panel: Color,
    pub bg_bar: Color,
    pub bg_selected: Color,

    // Borders
    pub border: Color,
    pub border_focus: Color,

    // Text
    pub text_muted: Color,
    pub text: Color,
    pub text_bright: Color,
    pub accent: Color,

    // Diff
    pub added: Color,
    pub removed: Color,
    pub added_bg: Color,
    pub removed_bg: Color,
    pub hunk_header: Color,
    pub renamed: Color,

    // Status
    pub error: Color,
    pub warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::builtin_default()
    }
}

/// User theme file: named color definitions plus a role → color map.
#[derive(Debug, Default, Deserialize)]
pub struct ThemeFile {
    /// Named colors, referenced from `theme` by name.
    #[serde(default)]
    pub defs: HashMap<String, String>,
    /// Role (camelCase field name) → hex value or def name.
    #[serde(default)]
    pub theme: HashMap<String, String>,
}

impl Theme {
    /// Load `name` from the user theme directory, else a built-in, else the default.
    pub fn load(name: &str) -> Self {
        if let Some(dir) = user_themes_dir() {
            if let Some(theme) = load_user_theme(&dir, name) {
                return theme;
            }
        }
        Self::builtin(name).unwrap_or_else(|| {
            if name != "default" {
                warn!(theme = name, "unknown theme, using default");
            }
            Self::builtin_default()
        })
    }

    /// A built-in palette by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::builtin_default()),
            "dracula" => Some(Self::dracula()),
            "nord" => Some(Self::nord()),
            "gruvbox" => Some(Self::gruvbox()),
            _ => None,
        }
    }

    /// Default dark palette.
    pub fn builtin_default() -> Self {
        Self {
            bg: Color::Rgb(18, 18, 22),
            bg_panel: Color::Rgb(26, 26, 32),
            bg_bar: Color::Rgb(36, 36, 44),
            bg_selected: Color::Rgb(45, 45, 55),
            border: Color::Rgb(50, 50, 60),
            border_focus: Color::Rgb(80, 200, 200),
            text_muted: Color::Rgb(80, 80, 92),
            text: Color::Rgb(175, 175, 185),
            text_bright: Color::Rgb(230, 230, 235),
            accent: Color::Rgb(80, 200, 200),
            added: Color::Rgb(85, 185, 105),
            removed: Color::Rgb(215, 85, 85),
            added_bg: Color::Rgb(25, 45, 32),
            removed_bg: Color::Rgb(45, 25, 30),
            hunk_header: Color::Rgb(110, 140, 200),
            renamed: Color::Rgb(55, 130, 130),
            error: Color::Rgb(215, 85, 85),
            warning: Color::Rgb(215, 175, 80),
        }
    }

    /// Dracula.
    pub fn dracula() -> Self {
        Self {
            bg: Color::Rgb(40, 42, 54),
            bg_panel: Color::Rgb(33, 34, 44),
            bg_bar: Color::Rgb(68, 71, 90),
            bg_selected: Color::Rgb(68, 71, 90),
            border: Color::Rgb(68, 71, 90),
            border_focus: Color::Rgb(189, 147, 249),
            text_muted: Color::Rgb(98, 114, 164),
            text: Color::Rgb(248, 248, 242),
            text_bright: Color::Rgb(255, 255, 255),
            accent: Color::Rgb(139, 233, 253),
            added: Color::Rgb(80, 250, 123),
            removed: Color::Rgb(255, 85, 85),
            added_bg: Color::Rgb(26, 58, 26),
            removed_bg: Color::Rgb(58, 26, 26),
            hunk_header: Color::Rgb(189, 147, 249),
            renamed: Color::Rgb(255, 121, 198),
            error: Color::Rgb(255, 85, 85),
            warning: Color::Rgb(241, 250, 140),
        }
    }

    /// Nord.
    pub fn nord() -> Self {
        Self {
            bg: Color::Rgb(46, 52, 64),
            bg_panel: Color::Rgb(59, 66, 82),
            bg_bar: Color::Rgb(67, 76, 94),
            bg_selected: Color::Rgb(76, 86, 106),
            border: Color::Rgb(67, 76, 94),
            border_focus: Color::Rgb(136, 192, 208),
            text_muted: Color::Rgb(96, 106, 126),
            text: Color::Rgb(216, 222, 233),
            text_bright: Color::Rgb(236, 239, 244),
            accent: Color::Rgb(136, 192, 208),
            added: Color::Rgb(163, 190, 140),
            removed: Color::Rgb(191, 97, 106),
            added_bg: Color::Rgb(45, 60, 55),
            removed_bg: Color::Rgb(60, 45, 50),
            hunk_header: Color::Rgb(129, 161, 193),
            renamed: Color::Rgb(180, 142, 173),
            error: Color::Rgb(191, 97, 106),
            warning: Color::Rgb(235, 203, 139),
        }
    }

    /// Gruvbox dark.
    pub fn gruvbox() -> Self {
        Self {
            bg: Color::Rgb(40, 40, 40),
            bg_panel: Color::Rgb(50, 48, 47),
            bg_bar: Color::Rgb(60, 56, 54),
            bg_selected: Color::Rgb(80, 73, 69),
            border: Color::Rgb(60, 56, 54),
            border_focus: Color::Rgb(215, 153, 33),
            text_muted: Color::Rgb(146, 131, 116),
            text: Color::Rgb(235, 219, 178),
            text_bright: Color::Rgb(251, 241, 199),
            accent: Color::Rgb(215, 153, 33),
            added: Color::Rgb(184, 187, 38),
            removed: Color::Rgb(251, 73, 52),
            added_bg: Color::Rgb(35, 55, 35),
            removed_bg: Color::Rgb(60, 35, 35),
            hunk_header: Color::Rgb(131, 165, 152),
            renamed: Color::Rgb(211, 134, 155),
            error: Color::Rgb(204, 36, 29),
            warning: Color::Rgb(250, 189, 47),
        }
    }

    /// Overlay the roles named in `file` on top of the default palette.
    pub fn from_file(file: &ThemeFile) -> Self {
        let mut theme = Self::builtin_default();
        for (role, value) in &file.theme {
            let Some(color) = resolve_color(value, &file.defs) else {
                warn!(role = %role, value = %value, "unresolvable theme color");
                continue;
            };
            match theme.slot(role) {
                Some(slot) => *slot = color,
                None => warn!(role = %role, "unknown theme role"),
            }
        }
        theme
    }

    fn slot(&mut self, role: &str) -> Option<&mut Color> {
        let slot = match role {
            "bg" => &mut self.bg,
            "bgPanel" => &mut self.bg_panel,
            "bgBar" => &mut self.bg_bar,
            "bgSelected" => &mut self.bg_selected,
            "border" => &mut self.border,
            "borderFocus" => &mut self.border_focus,
            "textMuted" => &mut self.text_muted,
            "text" => &mut self.text,
            "textBright" => &mut self.text_bright,
            "accent" => &mut self.accent,
            "added" => &mut self.added,
            "removed" => &mut self.removed,
            "addedBg" => &mut self.added_bg,
            "removedBg" => &mut self.removed_bg,
            "hunkHeader" => &mut self.hunk_header,
            "renamed" => &mut self.renamed,
            "error" => &mut self.error,
            "warning" => &mut self.warning,
            _ => return None,
        };
        Some(slot)
    }
}

/// `<config dir>/hunkwatch/themes`.
fn user_themes_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hunkwatch").join("themes"))
}

fn load_user_theme(dir: &Path, name: &str) -> Option<Theme> {
    let path = dir.join(format!("{name}.json"));
    let content = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<ThemeFile>(&content) {
        Ok(file) => Some(Theme::from_file(&file)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "malformed theme file");
            None
        }
    }
}

fn parse_hex(s: &str) -> Option<Color> {
    let s = s.strip_prefix('#')?;
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Hex literal, or the name of a def holding one.
fn resolve_color(value: &str, defs: &HashMap<String, String>) -> Option<Color> {
    if value.starts_with('#') {
        parse_hex(value)
    } else {
        defs.get(value).and_then(|def| parse_hex(def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_resolves() {
        for name in BUILTIN_THEMES {
            assert!(Theme::builtin(name).is_some(), "{name}");
        }
        assert!(Theme::builtin("solarized").is_none());
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_hex("ff8000"), None);
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }

    #[test]
    fn user_file_overrides_named_roles() {
        let file: ThemeFile = serde_json::from_str(
            r##"{
                "defs": { "lime": "#00ff00" },
                "theme": { "added": "lime", "removed": "#ff0000", "nope": "#000000", "accent": "missing" }
            }"##,
        )
        .unwrap();
        let theme = Theme::from_file(&file);
        let default = Theme::builtin_default();
        assert_eq!(theme.added, Color::Rgb(0, 255, 0));
        assert_eq!(theme.removed, Color::Rgb(255, 0, 0));
        assert_eq!(theme.accent, default.accent);
        assert_eq!(theme.text, default.text);
    }

    #[test]
    fn user_theme_loads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mine.json"),
            r##"{ "theme": { "bg": "#010203" } }"##,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let theme = load_user_theme(dir.path(), "mine").unwrap();
        assert_eq!(theme.bg, Color::Rgb(1, 2, 3));
        assert!(load_user_theme(dir.path(), "broken").is_none());
        assert!(load_user_theme(dir.path(), "absent").is_none());
    }
}
