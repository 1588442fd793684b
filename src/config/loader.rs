//! Configuration File Loading
//!
//! Resolves the per-user configuration directory and loads the optional
//! config file from it, in TOML or JSON.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the user's config root
const APP_DIR: &str = "lolsh";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    fn file_name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "config.toml",
            ConfigFormat::Json => "config.json",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    /// Directory holding config, history and startup script
    config_dir: PathBuf,
    /// Supported configuration file formats, in lookup order
    supported_formats: Vec<ConfigFormat>,
    /// Config file that was actually loaded, if any
    current_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at the default per-user directory
    pub fn new() -> Result<Self> {
        Ok(Self::with_dir(Self::default_config_dir()?))
    }

    /// Create a loader rooted at `config_dir`
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Resolve the default config directory.
    ///
    /// `$XDG_CONFIG_HOME/lolsh`, then the platform config dir, then
    /// `~/.config/lolsh`.
    pub fn default_config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            if !xdg_config.is_empty() {
                return Ok(PathBuf::from(xdg_config).join(APP_DIR));
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join(APP_DIR))
        } else if let Some(home) = dirs::home_dir() {
            Ok(home.join(".config").join(APP_DIR))
        } else {
            Err(Error::ConfigDirUnavailable)
        }
    }

    /// The directory this loader reads from
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The config file that was loaded, if one existed
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Create the config directory if it does not exist yet
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).map_err(|e| Error::ConfigLoadFailed {
            path: self.config_dir.clone(),
            reason: e.to_string(),
        })
    }

    /// Load the config file, falling back to defaults.
    ///
    /// A missing file yields defaults silently. A broken file is logged
    /// and also yields defaults, so a typo never locks the user out.
    pub fn load(&mut self) -> Config {
        for format in self.supported_formats.clone() {
            let path = self.config_dir.join(format.file_name());
            if !path.exists() {
                continue;
            }
            match Self::load_config_file(&path, format).and_then(|c| {
                validate_config(&c)?;
                Ok(c)
            }) {
                Ok(config) => {
                    debug!("loaded config from {}", path.display());
                    self.current_path = Some(path);
                    return config;
                }
                Err(e) => {
                    warn!("ignoring config {}: {}", path.display(), e);
                }
            }
        }
        debug!("no config file in {}, using defaults", self.config_dir.display());
        Config::default()
    }

    /// Load a specific configuration file
    pub fn load_config_file(path: &Path, format: ConfigFormat) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                format: format.label().to_string(),
                reason: e.to_string(),
            }),
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                    format: format.label().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Reject values the shell cannot run with
pub fn validate_config(config: &Config) -> Result<()> {
    if config.colorizer.command.trim().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "colorizer.command".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if config.shell.max_history == 0 {
        return Err(Error::ConfigValidationFailed {
            field: "shell.max_history".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.shell.history_file.trim().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "shell.history_file".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
