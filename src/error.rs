//! Error types and Result aliases for lolsh

use std::path::PathBuf;

/// Result type alias for lolsh operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lolsh
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Argument errors ===
    /// Builtin called with the wrong number of arguments
    #[error("{command}: expected {expected}, got {got} argument(s)")]
    ArgumentCount {
        command: String,
        expected: &'static str,
        got: usize,
    },

    /// History filter was not a valid regular expression
    #[error("invalid history pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // === OS errors ===
    /// `cd` could not change into the target directory
    #[error("cd: {}: {source}", path.display())]
    DirectoryChange {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Program not found on the search path
    #[error("{command}: command not found")]
    CommandNotFound { command: String },

    /// Program found but could not be started
    #[error("failed to spawn '{command}': {reason}")]
    CommandSpawnFailed { command: String, reason: String },

    /// No usable configuration directory
    #[error("could not determine configuration directory")]
    ConfigDirUnavailable,

    /// Configuration file exists but could not be read
    #[error("failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Configuration value out of range
    #[error("invalid config value for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Configuration file could not be parsed
    #[error("failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    // === Terminal / PTY errors ===
    /// Failed to allocate a pseudo-terminal
    #[error("failed to create pty for '{command}': {reason}")]
    PtyCreationFailed { command: String, reason: String },

    /// Failed to clone the pty master reader
    #[error("failed to clone pty reader: {reason}")]
    PtyReaderCloneFailed { reason: String },

    /// Failed to take the pty master writer
    #[error("failed to take pty writer: {reason}")]
    PtyWriterTakeFailed { reason: String },

    /// Failed to propagate the terminal size to the pty
    #[error("failed to resize pty: {reason}")]
    PtyResizeFailed { reason: String },

    /// Could not switch the terminal into raw mode
    #[error("failed to enter raw mode: {reason}")]
    RawModeFailed { reason: String },

    /// Could not put the saved terminal mode back
    #[error("failed to restore terminal mode: {reason}")]
    TerminalRestoreFailed { reason: String },

    /// Forwarding keyboard input to the pty failed
    #[error("failed to forward input: {reason}")]
    InputForwardFailed { reason: String },

    /// The pty accepted fewer bytes than were read from the terminal
    #[error("short write to pty: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// The colorizing filter could not be started
    #[error("failed to start colorizer '{command}': {reason}")]
    ColorizerSpawnFailed { command: String, reason: String },

    // === Child exit errors ===
    /// Child exited with a nonzero status
    #[error("{command}: exited with status {code}")]
    CommandFailed { command: String, code: i32 },

    /// Child was terminated by a signal
    #[error("{command}: terminated by signal {signal}")]
    CommandSignaled { command: String, signal: i32 },

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors (for cases not yet categorized)
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Convenience constructor for builtin arity errors
    pub fn arity(command: &str, expected: &'static str, got: usize) -> Self {
        Error::ArgumentCount {
            command: command.to_string(),
            expected,
            got,
        }
    }

    /// Whether this is a usage error from a builtin
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Error::ArgumentCount { .. } | Error::InvalidPattern(_))
    }

    /// Whether this came from a child's exit status rather than from the shell
    pub fn is_child_exit(&self) -> bool {
        matches!(
            self,
            Error::CommandFailed { .. } | Error::CommandSignaled { .. }
        )
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

/// Print an error through the shell's single reporting path.
///
/// Everything a user command can produce ends up here: a red `error: `
/// prefix on stderr followed by the message.
pub fn report_error(err: &Error) {
    use std::io::Write;

    debug!("reporting error: {:?}", err);
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}{}", crate::ansi::red("error: "), err);
}
