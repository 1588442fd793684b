//! PTY Process Spawning
//!
//! Allocates a pseudo-terminal with `portable-pty` and starts the target
//! program with the slave side as its controlling terminal.

use std::sync::{Arc, Mutex};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use crate::error::{Error, Result};
use crate::runner::CommandSpec;

/// Master side shared between the bridge and the resize task
pub type SharedMaster = Arc<Mutex<Box<dyn MasterPty + Send>>>;

/// One pty and the child attached to it
pub struct PtySession {
    /// Master side of the pty
    pub master: SharedMaster,
    /// The child running on the slave side
    pub child: Box<dyn Child + Send + Sync>,
}

/// Open a pty of `size` and spawn `spec` on it
pub fn spawn_pty_process(spec: &CommandSpec, size: PtySize) -> Result<PtySession> {
    let pty_system = native_pty_system();

    let pair = pty_system
        .openpty(size)
        .map_err(|e| Error::PtyCreationFailed {
            command: spec.program.clone(),
            reason: e.to_string(),
        })?;
    debug!("opened pty {}x{} for {}", size.cols, size.rows, spec.program);

    let mut cmd_builder = CommandBuilder::new(&spec.path);
    cmd_builder.args(&spec.args);
    cmd_builder.env_clear();
    for (key, value) in &spec.env {
        cmd_builder.env(key, value);
    }
    cmd_builder.cwd(&spec.cwd);

    let child = pair
        .slave
        .spawn_command(cmd_builder)
        .map_err(|e| Error::CommandSpawnFailed {
            command: spec.program.clone(),
            reason: e.to_string(),
        })?;

    // Only the child may hold the slave; otherwise the master never sees
    // EOF when the child exits.
    drop(pair.slave);

    debug!("spawned {} on pty (pid {:?})", spec.program, child.process_id());
    Ok(PtySession {
        master: Arc::new(Mutex::new(pair.master)),
        child,
    })
}

/// Lock the shared master, mapping poisoning to an error
pub(crate) fn lock_master(
    master: &SharedMaster,
) -> Result<std::sync::MutexGuard<'_, Box<dyn MasterPty + Send>>> {
    master
        .lock()
        .map_err(|_| Error::Other("pty master lock poisoned".to_string()))
}
