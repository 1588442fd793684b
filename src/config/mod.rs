//! Configuration management for lolsh
//!
//! Configuration lives in a per-user directory (`~/.config/lolsh` by
//! default) next to the history file and the startup script. The config
//! file itself is optional; every field has a default.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::history::MAX_HISTORY_ENTRIES;

/// Environment variable that turns colorization off for the whole session
pub const NO_COLOR_ENV: &str = "NOLOL";

/// Main configuration structure for lolsh
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Colorizing filter configuration
    pub colorizer: ColorizerConfig,

    /// Shell behaviour and persisted-state file names
    pub shell: ShellConfig,
}

/// The external program every command's output is piped through
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorizerConfig {
    /// Filter executable, looked up on PATH
    pub command: String,

    /// Extra arguments for the filter
    pub args: Vec<String>,

    /// Whether commands are colorized unless overridden
    pub enabled: bool,
}

impl Default for ColorizerConfig {
    fn default() -> Self {
        Self {
            command: "lolcat".to_string(),
            args: Vec::new(),
            enabled: true,
        }
    }
}

/// Shell-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    /// History file name, relative to the config directory
    pub history_file: String,

    /// Startup script name, relative to the config directory
    pub startup_file: String,

    /// Maximum number of history entries kept
    pub max_history: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_file: "history".to_string(),
            startup_file: "lolshrc".to_string(),
            max_history: MAX_HISTORY_ENTRIES,
        }
    }
}

impl Config {
    /// Path of the history file inside `config_dir`
    pub fn history_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.shell.history_file)
    }

    /// Path of the startup script inside `config_dir`
    pub fn startup_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.shell.startup_file)
    }

    /// Whether colorization is on once the environment toggle is applied
    pub fn colorize_by_default(&self, toggle: Option<&str>) -> bool {
        self.colorizer.enabled && !toggle.map(is_truthy).unwrap_or(false)
    }
}

/// Interpret an environment value as a boolean switch.
///
/// `1`, `true`, `yes` and `on` (any case) are true; everything else,
/// including the empty string, is false.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
