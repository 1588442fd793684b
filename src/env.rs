//! Session environment
//!
//! The shell keeps its own variable mapping instead of mutating the
//! process environment. `set` writes here, `$NAME` expansion reads from
//! here, and every child process is started with exactly this mapping.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Variable mapping plus the home directory used for `~` expansion
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
    home: PathBuf,
}

impl Environment {
    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Build from raw OS pairs, dropping any that are not valid UTF-8
    pub fn from_os_vars<I>(os_vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars: HashMap<String, String> = os_vars
            .into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    debug!("skipping non UTF-8 environment entry {:?}", key);
                    None
                }
            })
            .collect();
        let home = vars
            .get("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));
        Self { vars, home }
    }

    /// Build an environment from explicit parts (used by tests and embedders)
    pub fn with_vars<I, K, V>(vars: I, home: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            home: home.into(),
        }
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Look up a variable, treating unset as the empty string
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Set or replace a variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if key == "HOME" && !value.is_empty() {
            self.home = PathBuf::from(&value);
        }
        self.vars.insert(key, value);
    }

    /// Home directory for `cd` with no arguments and `~` expansion
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// All variables, for handing to a child process
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }
}
