//! Window size forwarding
//!
//! Keeps the pty the same size as the real terminal: once when the bridge
//! starts and again on every SIGWINCH until stopped.

use portable_pty::PtySize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

use super::process::{lock_master, SharedMaster};
use crate::error::{Error, Result};
use crate::terminal;

/// Copy the real terminal's size onto the pty.
///
/// Returns the size applied, or `None` when no terminal is attached.
pub fn sync_size(master: &SharedMaster) -> Result<Option<PtySize>> {
    let Some(size) = terminal::window_size() else {
        return Ok(None);
    };
    apply_size(master, size)?;
    Ok(Some(size))
}

/// Set the pty to an explicit size
pub fn apply_size(master: &SharedMaster, size: PtySize) -> Result<()> {
    lock_master(master)?
        .resize(size)
        .map_err(|e| Error::PtyResizeFailed {
            reason: e.to_string(),
        })?;
    debug!("pty resized to {}x{}", size.cols, size.rows);
    Ok(())
}

/// Background task forwarding SIGWINCH to the pty
pub struct ResizeForwarder {
    task: JoinHandle<()>,
}

impl ResizeForwarder {
    /// Subscribe to SIGWINCH, sync once, then keep syncing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(master: SharedMaster) -> Result<Self> {
        let mut winch = signal(SignalKind::window_change())?;

        if let Err(e) = sync_size(&master) {
            warn!("initial pty resize failed: {}", e);
        }

        let task = tokio::spawn(async move {
            while winch.recv().await.is_some() {
                if let Err(e) = sync_size(&master) {
                    warn!("{}", e);
                }
            }
        });

        Ok(Self { task })
    }

    /// Stop forwarding and release the task's handle on the master
    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
        debug!("resize forwarder stopped");
    }
}
