//! Shell session state
//!
//! A [`Session`] is the one value that carries everything a command may
//! read or change: the variable mapping, the history buffer, the exit flag
//! and the colorization default. The working directory itself lives in the
//! OS and is mirrored into `PWD` so children see it.

use std::path::{Path, PathBuf};

use crate::ansi::{paint, Color};
use crate::config::{Config, NO_COLOR_ENV};
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::history::HistoryManager;

/// Value written to `SHELL` at startup
pub const SHELL_NAME: &str = "lolsh";

/// Process-wide mutable state, passed explicitly to every command
#[derive(Debug)]
pub struct Session {
    /// Variables visible to expansion and to child processes
    pub env: Environment,
    /// Entered lines, oldest first
    pub history: HistoryManager,
    colorize_default: bool,
    exit_requested: bool,
}

impl Session {
    /// Build a session, applying the `NOLOL` toggle from `env`
    pub fn new(mut env: Environment, history: HistoryManager, config: &Config) -> Self {
        let colorize_default = config.colorize_by_default(env.get(NO_COLOR_ENV));
        env.set("SHELL", SHELL_NAME);
        if let Ok(cwd) = std::env::current_dir() {
            env.set("PWD", cwd.to_string_lossy());
        }
        debug!("session started (colorize: {})", colorize_default);

        Self {
            env,
            history,
            colorize_default,
            exit_requested: false,
        }
    }

    /// Ask the REPL to stop after the current command
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Whether external commands go through the colorizer unless overridden
    pub fn colorize_default(&self) -> bool {
        self.colorize_default
    }

    /// Current working directory, falling back to `PWD` and then home
    pub fn cwd(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| {
            self.env
                .get("PWD")
                .map(PathBuf::from)
                .unwrap_or_else(|| self.env.home().to_path_buf())
        })
    }

    /// Change the OS working directory and mirror it into `PWD`.
    ///
    /// On failure nothing changes.
    pub fn change_dir(&mut self, path: &Path) -> Result<()> {
        std::env::set_current_dir(path).map_err(|source| Error::DirectoryChange {
            path: path.to_path_buf(),
            source,
        })?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| path.to_path_buf());
        debug!("cwd is now {}", cwd.display());
        self.env.set("PWD", cwd.to_string_lossy());
        Ok(())
    }

    /// Render `user@host [dir] $ ` with home collapsed to `~`
    pub fn prompt(&self) -> String {
        let user = self
            .env
            .get("USER")
            .filter(|u| !u.is_empty())
            .unwrap_or("user")
            .to_string();
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());
        let dir = collapse_home(&self.cwd(), self.env.home());

        format!(
            "{}@{} [{}] $ ",
            paint(&user, Color::Green),
            paint(&host, Color::Green),
            paint(&dir, Color::Blue)
        )
    }
}

/// Display `cwd` with a leading home directory replaced by `~`
pub fn collapse_home(cwd: &Path, home: &Path) -> String {
    if home.as_os_str().is_empty() || home == Path::new("/") {
        return cwd.display().to_string();
    }
    match cwd.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => cwd.display().to_string(),
    }
}
