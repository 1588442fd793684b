//! REPL loop
//!
//! [`Shell`] ties the pieces together: it renders the prompt, reads one line
//! at a time, records it in history and hands each statement to the
//! dispatcher. The loop moves through three states:
//!
//! ```text
//! Running ──exit / EOF──▶ ExitRequested ──flush history──▶ Terminated
//! ```

use std::fs;
use std::io::{BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::builtins::Dispatcher;
use crate::config::loader::ConfigLoader;
use crate::env::Environment;
use crate::error::{report_error, Result};
use crate::history::HistoryManager;
use crate::parser::{parse_statement, split_statements};
use crate::runner::ProcessRunner;
use crate::session::Session;

/// Where the REPL is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    Running,
    ExitRequested,
    Terminated,
}

/// The interactive shell
pub struct Shell {
    session: Session,
    dispatcher: Dispatcher,
    state: ReplState,
    startup_script: Option<PathBuf>,
}

impl Shell {
    pub fn new(session: Session, dispatcher: Dispatcher) -> Self {
        Self {
            session,
            dispatcher,
            state: ReplState::Running,
            startup_script: None,
        }
    }

    /// Run `path` once before the first prompt, if it exists
    pub fn with_startup_script(mut self, path: PathBuf) -> Self {
        self.startup_script = Some(path);
        self
    }

    /// Build a shell from the user's config directory.
    ///
    /// `config_dir` overrides the default location. Failing to create the
    /// directory or to open the history file aborts startup.
    pub fn bootstrap(config_dir: Option<PathBuf>) -> Result<Self> {
        let mut loader = match config_dir {
            Some(dir) => ConfigLoader::with_dir(dir),
            None => ConfigLoader::new()?,
        };
        loader.ensure_dir()?;
        let config = loader.load();
        let dir = loader.config_dir();

        let history = HistoryManager::with_path(config.history_path(dir), config.shell.max_history)?;
        debug!("loaded {} history entries", history.len());

        let session = Session::new(Environment::from_process(), history, &config);
        let runner = ProcessRunner::new(config.colorizer.clone())?;
        let dispatcher = Dispatcher::new(Box::new(runner));

        Ok(Self::new(session, dispatcher).with_startup_script(config.startup_path(dir)))
    }

    pub fn state(&self) -> ReplState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Parse and run every statement on `line`.
    ///
    /// Errors are reported and never stop the shell. Statements after an
    /// `exit` are skipped. Returns whether exit was requested.
    pub fn execute_line(&mut self, line: &str) -> bool {
        for statement in split_statements(line) {
            if self.session.exit_requested() {
                break;
            }
            // Parse lazily so `set` is visible to later statements.
            let Some(command) = parse_statement(statement, &self.session.env) else {
                continue;
            };
            if let Err(e) = self.dispatcher.run(&mut self.session, &command) {
                report_error(&e);
            }
        }
        if self.session.exit_requested() && self.state == ReplState::Running {
            self.state = ReplState::ExitRequested;
        }
        self.session.exit_requested()
    }

    /// Execute the startup script line by line. A missing script is fine.
    pub fn run_startup_script(&mut self) -> Result<()> {
        let Some(path) = self.startup_script.clone() else {
            return Ok(());
        };
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no startup script at {}", path.display());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        info!("running startup script {}", path.display());
        for line in contents.lines() {
            if self.execute_line(line) {
                break;
            }
        }
        Ok(())
    }

    /// Run the loop until `exit` or end of input, then flush history.
    ///
    /// The prompt goes to `out`; command output goes straight to the
    /// terminal.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> Result<()> {
        let mut line = String::new();

        while self.state == ReplState::Running {
            write!(out, "{}", self.session.prompt())?;
            out.flush()?;

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => {
                    // Ctrl-D at the prompt.
                    writeln!(out)?;
                    self.session.request_exit();
                    self.state = ReplState::ExitRequested;
                    continue;
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            let entry = line.trim_end_matches(['\n', '\r']);
            if entry.trim().is_empty() {
                continue;
            }
            if let Err(e) = self.session.history.add(entry) {
                warn!("could not record history: {}", e);
            }
            self.execute_line(entry);
        }

        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.state == ReplState::Terminated {
            return Ok(());
        }
        self.state = ReplState::Terminated;
        self.session.history.flush()?;
        debug!("shell terminated");
        Ok(())
    }

    /// History file in use, if any
    pub fn history_file(&self) -> Option<&Path> {
        self.session.history.history_file()
    }
}
