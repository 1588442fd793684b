//! Persistent command history
//!
//! History is a plain text file with one entry per line, kept in the
//! config directory. Entries are appended as they are entered and the
//! whole buffer is rewritten once when the shell exits cleanly.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::Result;

/// Maximum number of history entries to keep
pub const MAX_HISTORY_ENTRIES: usize = 10_000;

/// Command history buffer backed by an optional file
#[derive(Debug)]
pub struct HistoryManager {
    /// Path to the history file; `None` keeps history in memory only
    history_file: Option<PathBuf>,
    /// In-memory history, oldest first
    history: VecDeque<String>,
    /// Maximum history size
    max_size: usize,
}

impl HistoryManager {
    /// Open the history file at `path`, creating it if missing
    pub fn with_path(path: PathBuf, max_size: usize) -> Result<Self> {
        let mut manager = Self {
            history_file: Some(path),
            history: VecDeque::new(),
            max_size: max_size.max(1),
        };
        manager.load()?;
        Ok(manager)
    }

    /// History that is never written anywhere
    pub fn in_memory(max_size: usize) -> Self {
        Self {
            history_file: None,
            history: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// Load history from file, replacing the in-memory buffer
    pub fn load(&mut self) -> Result<()> {
        let Some(path) = self.history_file.clone() else {
            return Ok(());
        };

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            File::create(&path)?;
            return Ok(());
        }

        let reader = BufReader::new(File::open(&path)?);

        self.history.clear();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                self.history.push_back(line);
            }
        }
        self.trim();

        debug!("loaded {} history entries from {}", self.history.len(), path.display());
        Ok(())
    }

    /// Rewrite the history file from the in-memory buffer
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.history_file else {
            return Ok(());
        };

        let mut file = File::create(path)?;
        for entry in &self.history {
            writeln!(file, "{}", entry)?;
        }
        file.flush()?;
        debug!("flushed {} history entries to {}", self.history.len(), path.display());
        Ok(())
    }

    /// Add an entry and append it to the file
    pub fn add(&mut self, entry: &str) -> Result<()> {
        let entry = entry.trim_end_matches(['\r', '\n']);
        if entry.trim().is_empty() {
            return Ok(());
        }

        self.history.push_back(entry.to_string());
        self.trim();

        if let Some(path) = &self.history_file {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", entry)?;
        }
        Ok(())
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &VecDeque<String> {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Entries matching `pattern`, paired with their 1-based index
    pub fn matching(&self, pattern: &str) -> Result<Vec<(usize, &str)>> {
        let re = Regex::new(pattern)?;
        Ok(self
            .numbered()
            .filter(|(_, entry)| re.is_match(entry))
            .collect())
    }

    /// Write entries as `index  text`, optionally filtered by a regex
    pub fn render(&self, pattern: Option<&str>, out: &mut dyn Write) -> Result<()> {
        let rows: Vec<(usize, &str)> = match pattern {
            Some(p) => self.matching(p)?,
            None => self.numbered().collect(),
        };
        for (index, entry) in rows {
            writeln!(out, "{:>5}  {}", index, entry)?;
        }
        Ok(())
    }

    /// History file path, if persisted
    pub fn history_file(&self) -> Option<&Path> {
        self.history_file.as_deref()
    }

    fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.history
            .iter()
            .enumerate()
            .map(|(i, entry)| (i + 1, entry.as_str()))
    }

    fn trim(&mut self) {
        while self.history.len() > self.max_size {
            self.history.pop_front();
        }
    }
}
