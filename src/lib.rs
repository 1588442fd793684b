//! lolsh - an interactive shell that colorizes everything
//!
//! Every external command runs behind a pseudoterminal and its output is
//! piped through an external colorizer (`lolcat` by default) before it
//! reaches the screen. The shell itself is deliberately small: builtins,
//! `$VAR` and `~` expansion, `;` separators and `#` comments.
//!
//! ## Module Organization
//!
//! ### Execution core
//!
//! - [`pty`] - PTY colorizer bridge: pty allocation, input copier, resize
//!   forwarding, colorizer process
//! - [`terminal`] - Raw mode guard and window size queries
//! - [`runner`] - External command execution, colorized or direct
//!
//! ### Shell
//!
//! - [`parser`] - Line parsing passes (split, strip comment, tokenize, expand)
//! - [`builtins`] - Builtin table and dispatcher
//! - [`session`] - Session state and prompt rendering
//! - [`shell`] - The REPL loop
//!
//! ### Support
//!
//! - [`config`] - Configuration loading
//! - [`history`] - Persistent command history
//! - [`env`] - Session variable mapping
//! - [`ansi`] - Color helpers for the prompt and error prefix
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use lolsh::Shell;
//!
//! # fn main() -> lolsh::Result<()> {
//! let mut shell = Shell::bootstrap(None)?;
//! shell.run_startup_script()?;
//! shell.run(std::io::stdin().lock(), std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! The REPL is single threaded and runs one command at a time. While a
//! colorized command runs, a private tokio runtime drives the colorizer
//! feeder and resize forwarding, and two plain threads do the blocking pty
//! reads and terminal input copying.

#[macro_use]
extern crate tracing;

pub mod ansi;
pub mod builtins;
pub mod config;
pub mod env;
pub mod error;
pub mod history;
pub mod parser;
pub mod pty;
pub mod runner;
pub mod session;
pub mod shell;
pub mod terminal;

pub use builtins::{Dispatcher, ExecOptions};
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use env::Environment;
pub use error::{report_error, Error, Result};
pub use history::HistoryManager;
pub use parser::{parse_line, ParsedCommand};
pub use runner::{CommandRunner, ProcessRunner};
pub use session::Session;
pub use shell::{ReplState, Shell};

/// The current version of lolsh from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
