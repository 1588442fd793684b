//! Real terminal state
//!
//! Everything the shell does to the terminal it was started from: switching
//! it into raw mode around pty-backed commands and querying its size so the
//! pty can mirror it.

pub mod raw;
pub mod size;

// Re-exports for convenience
pub use raw::{RawModeGuard, SavedMode};
pub use size::{current_size, window_size, DEFAULT_SIZE};

use std::io::IsTerminal;

/// Whether standard input is attached to a terminal
pub fn stdin_is_tty() -> bool {
    std::io::stdin().is_terminal()
}
