//! Raw mode with guaranteed restore
//!
//! [`RawModeGuard::enter`] snapshots the terminal's current settings and
//! switches it to raw mode. The snapshot is put back exactly once: either by
//! an explicit [`RawModeGuard::restore`] (which reports failure) or, if the
//! guard is dropped first, on drop. Early returns, `?` and unwinding all go
//! through drop.

use std::io::{self, Stdin};
use std::os::fd::AsFd;

use nix::sys::termios::{self, SetArg, Termios};

use crate::error::{Error, Result};

/// Terminal settings captured before entering raw mode
#[derive(Clone)]
pub struct SavedMode(Termios);

impl std::fmt::Debug for SavedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavedMode")
            .field("local_flags", &self.0.local_flags)
            .finish()
    }
}

/// Scoped raw mode on standard input
pub struct RawModeGuard {
    stdin: Stdin,
    saved: Option<SavedMode>,
}

impl RawModeGuard {
    /// Save the current mode and switch standard input to raw mode
    pub fn enter() -> Result<Self> {
        let stdin = io::stdin();

        let original = termios::tcgetattr(stdin.as_fd()).map_err(|e| Error::RawModeFailed {
            reason: e.to_string(),
        })?;

        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &raw).map_err(|e| {
            Error::RawModeFailed {
                reason: e.to_string(),
            }
        })?;

        debug!("terminal switched to raw mode");
        Ok(Self {
            stdin,
            saved: Some(SavedMode(original)),
        })
    }

    /// Like [`enter`](Self::enter), but a no-op guard when stdin is not a tty.
    ///
    /// Piped or redirected input has no line discipline to change.
    pub fn enter_if_tty() -> Result<Self> {
        if super::stdin_is_tty() {
            Self::enter()
        } else {
            debug!("stdin is not a terminal, leaving mode unchanged");
            Ok(Self::inactive())
        }
    }

    /// A guard that holds no saved mode and restores nothing
    pub fn inactive() -> Self {
        Self {
            stdin: io::stdin(),
            saved: None,
        }
    }

    /// Whether a saved mode is still waiting to be restored
    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }

    /// Put the saved mode back now and report the outcome
    pub fn restore(mut self) -> Result<()> {
        self.restore_saved()
    }

    fn restore_saved(&mut self) -> Result<()> {
        let Some(SavedMode(original)) = self.saved.take() else {
            return Ok(());
        };
        termios::tcsetattr(self.stdin.as_fd(), SetArg::TCSANOW, &original).map_err(|e| {
            Error::TerminalRestoreFailed {
                reason: e.to_string(),
            }
        })?;
        debug!("terminal mode restored");
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore_saved() {
            error!("{}", e);
        }
    }
}
