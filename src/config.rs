//! Configuration and color scheme management for vtterm.
//!
//! This module provides:
//! - Terminal [`Settings`] consumed by the interpreter (width, tab size,
//!   newline modes, hex output, local echo, input capacity)
//! - TOML configuration file loading from `~/.vtterm/config.toml`
//! - Built-in ANSI palettes used by the renderer
//!
//! # Configuration File
//!
//! ```toml
//! # Palette: default, solarized-dark, monokai, nord, dracula
//! color_scheme = "nord"
//!
//! [terminal]
//! terminal_width = 80
//! tab_size = 8
//! newline_recv = "crlf"   # cr, lf, crlf
//! newline_send = "cr"
//! hex_output = false
//! local_echo = false
//! input_capacity = 1024
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest input buffer that still leaves room for one character
pub const MIN_INPUT_CAPACITY: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Terminal width must be positive")]
    ZeroWidth,

    #[error("Tab size must be positive")]
    ZeroTabSize,

    #[error("Input capacity must be at least 3 bytes, got {0}")]
    InputCapacity(usize),

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Line ending convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewlineMode {
    Cr,
    Lf,
    CrLf,
}

impl NewlineMode {
    /// Parse a CLI value (`cr`, `lf`, `crlf`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cr" => Some(NewlineMode::Cr),
            "lf" => Some(NewlineMode::Lf),
            "crlf" | "cr+lf" | "cr-lf" => Some(NewlineMode::CrLf),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            NewlineMode::Cr => b"\r",
            NewlineMode::Lf => b"\n",
            NewlineMode::CrLf => b"\r\n",
        }
    }
}

/// Terminal settings, owned by a session and applied to subsequent parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Columns before the cursor wraps
    pub terminal_width: usize,
    pub tab_size: usize,
    /// What the remote end uses as end-of-line
    pub newline_recv: NewlineMode,
    /// What the Return key sends
    pub newline_send: NewlineMode,
    /// Dump inbound bytes as hex rows instead of interpreting them
    pub hex_output: bool,
    pub local_echo: bool,
    /// Input buffer size in bytes
    pub input_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            terminal_width: 80,
            tab_size: 8,
            newline_recv: NewlineMode::CrLf,
            newline_send: NewlineMode::Cr,
            hex_output: false,
            local_echo: false,
            input_capacity: 1024,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal_width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.tab_size == 0 {
            return Err(ConfigError::ZeroTabSize);
        }
        if self.input_capacity < MIN_INPUT_CAPACITY {
            return Err(ConfigError::InputCapacity(self.input_capacity));
        }
        Ok(())
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Color scheme name
    pub color_scheme: String,
    pub terminal: Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color_scheme: "default".to_string(),
            terminal: Settings::default(),
        }
    }
}

impl Config {
    /// Load configuration from `~/.vtterm/config.toml`, falling back to
    /// defaults when the file is missing or broken
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring config: {}", e),
                }
            }
        }
        Self::default()
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.terminal.validate()?;
        Ok(config)
    }

    /// Get config file path
    pub fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".vtterm").join("config.toml"))
    }

    /// Get the color scheme
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// ANSI palette plus default foreground/background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub name: String,
    pub foreground: Rgb,
    pub background: Rgb,
    /// black, red, green, yellow, blue, magenta, cyan, white
    pub ansi: [Rgb; 8],
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    /// Classic VGA-ish palette
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),
            foreground: Rgb::new(192, 192, 192),
            background: Rgb::new(0, 0, 0),
            ansi: [
                Rgb::new(0, 0, 0),
                Rgb::new(170, 0, 0),
                Rgb::new(0, 170, 0),
                Rgb::new(170, 85, 0),
                Rgb::new(0, 0, 170),
                Rgb::new(170, 0, 170),
                Rgb::new(0, 170, 170),
                Rgb::new(170, 170, 170),
            ],
        }
    }

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            foreground: Rgb::new(131, 148, 150),
            background: Rgb::new(0, 43, 54),
            ansi: [
                Rgb::new(7, 54, 66),
                Rgb::new(220, 50, 47),
                Rgb::new(133, 153, 0),
                Rgb::new(181, 137, 0),
                Rgb::new(38, 139, 210),
                Rgb::new(211, 54, 130),
                Rgb::new(42, 161, 152),
                Rgb::new(238, 232, 213),
            ],
        }
    }

    /// Monokai scheme
    pub fn monokai() -> Self {
        Self {
            name: "monokai".to_string(),
            foreground: Rgb::new(248, 248, 242),
            background: Rgb::new(39, 40, 34),
            ansi: [
                Rgb::new(39, 40, 34),
                Rgb::new(249, 38, 114),
                Rgb::new(166, 226, 46),
                Rgb::new(244, 191, 117),
                Rgb::new(102, 217, 239),
                Rgb::new(174, 129, 255),
                Rgb::new(161, 239, 228),
                Rgb::new(248, 248, 242),
            ],
        }
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            foreground: Rgb::new(216, 222, 233),
            background: Rgb::new(46, 52, 64),
            ansi: [
                Rgb::new(59, 66, 82),
                Rgb::new(191, 97, 106),
                Rgb::new(163, 190, 140),
                Rgb::new(235, 203, 139),
                Rgb::new(129, 161, 193),
                Rgb::new(180, 142, 173),
                Rgb::new(136, 192, 208),
                Rgb::new(229, 233, 240),
            ],
        }
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            foreground: Rgb::new(248, 248, 242),
            background: Rgb::new(40, 42, 54),
            ansi: [
                Rgb::new(33, 34, 44),
                Rgb::new(255, 85, 85),
                Rgb::new(80, 250, 123),
                Rgb::new(241, 250, 140),
                Rgb::new(189, 147, 249),
                Rgb::new(255, 121, 198),
                Rgb::new(139, 233, 253),
                Rgb::new(248, 248, 242),
            ],
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solarized-dark" | "solarized_dark" => Self::solarized_dark(),
            "monokai" => Self::monokai(),
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            _ => Self::default_scheme(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "solarized-dark", "monokai", "nord", "dracula"]
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = Settings {
            terminal_width: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::ZeroWidth)));

        settings.terminal_width = 80;
        settings.tab_size = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::ZeroTabSize)));

        settings.tab_size = 4;
        settings.input_capacity = 2;
        assert!(matches!(settings.validate(), Err(ConfigError::InputCapacity(2))));
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml(
            r#"
            color_scheme = "nord"

            [terminal]
            terminal_width = 40
            newline_recv = "lf"
            hex_output = true
            "#,
        )
        .unwrap();

        assert_eq!(config.get_color_scheme().name, "nord");
        assert_eq!(config.terminal.terminal_width, 40);
        assert_eq!(config.terminal.newline_recv, NewlineMode::Lf);
        assert_eq!(config.terminal.newline_send, NewlineMode::Cr);
        assert!(config.terminal.hex_output);
        assert_eq!(config.terminal.tab_size, 8);
    }

    #[test]
    fn test_toml_rejects_bad_values() {
        assert!(matches!(
            Config::from_toml("[terminal]\ntab_size = 0\n"),
            Err(ConfigError::ZeroTabSize)
        ));
        assert!(matches!(
            Config::from_toml("[terminal]\nnewline_recv = \"nope\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/vtterm.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_newline_mode_parse() {
        assert_eq!(NewlineMode::parse("CRLF"), Some(NewlineMode::CrLf));
        assert_eq!(NewlineMode::parse("lf"), Some(NewlineMode::Lf));
        assert_eq!(NewlineMode::parse("x"), None);
        assert_eq!(NewlineMode::CrLf.as_bytes(), b"\r\n");
    }

    #[test]
    fn test_unknown_scheme_falls_back() {
        assert_eq!(ColorScheme::by_name("nope").name, "default");
        for name in ColorScheme::list() {
            assert_eq!(ColorScheme::by_name(name).name, name);
        }
    }
}
