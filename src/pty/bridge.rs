//! PTY colorizer bridge
//!
//! Runs one command behind a pty and shows its output through the
//! colorizer:
//!
//! ```text
//!  keyboard ──▶ InputCopier ──▶ pty master ──▶ child (slave side)
//!                                   │
//!  screen ◀── colorizer ◀── feeder ◀── output pump
//! ```
//!
//! Teardown always runs in the same order: the colorizer is awaited, then
//! the input copier is stopped, then the pty is closed, and finally the
//! terminal mode is restored.

use std::io::Write;
use std::thread::JoinHandle;

use portable_pty::{Child, ChildKiller};

use super::colorizer::Colorizer;
use super::copier::InputCopier;
use super::process::{lock_master, spawn_pty_process, PtySession, SharedMaster};
use super::resize::ResizeForwarder;
use super::streams::{output_channel, spawn_output_pump};
use crate::config::ColorizerConfig;
use crate::error::{Error, Result};
use crate::runner::{check_pty_status, CommandSpec};
use crate::terminal::{self, RawModeGuard};

/// Run `spec` on a fresh pty with its output piped through the colorizer
pub async fn run_colorized(spec: &CommandSpec, colorizer: &ColorizerConfig) -> Result<()> {
    let PtySession { master, child } = spawn_pty_process(spec, terminal::current_size())?;
    let mut killer = child.clone_killer();

    let resizer = match ResizeForwarder::start(master.clone()) {
        Ok(resizer) => Some(resizer),
        Err(e) => {
            warn!("window size changes will not reach the pty: {}", e);
            None
        }
    };

    let raw = match RawModeGuard::enter_if_tty() {
        Ok(guard) => guard,
        Err(e) => {
            abandon_child(killer.as_mut(), child).await;
            if let Some(resizer) = resizer {
                resizer.stop().await;
            }
            return Err(e);
        }
    };

    let outcome = pump(spec, colorizer, &master, child, killer.as_mut()).await;

    if let Some(resizer) = resizer {
        resizer.stop().await;
    }
    drop(master);
    debug!("pty closed");

    let restored = raw.restore();
    match (outcome, restored) {
        (Err(e), Err(restore_err)) => {
            error!("{}", restore_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), restored) => restored,
    }
}

/// Stream keyboard → pty → colorizer → screen until the child is done.
///
/// On return the colorizer has exited, the child has been reaped and the
/// input copier has been stopped. The pty itself is still open.
async fn pump(
    spec: &CommandSpec,
    config: &ColorizerConfig,
    master: &SharedMaster,
    mut child: Box<dyn Child + Send + Sync>,
    killer: &mut (dyn ChildKiller + Send + Sync),
) -> Result<()> {
    let (mut input, pump_thread, colorizer) = match start_streams(spec, config, master) {
        Ok(parts) => parts,
        Err(e) => {
            abandon_child(killer, child).await;
            return Err(e);
        }
    };

    let filter_status = {
        let filter = colorizer.wait();
        tokio::pin!(filter);
        match &mut input {
            PtyInput::Forwarded(copier) => tokio::select! {
                status = &mut filter => status,
                reason = copier.failed() => {
                    warn!("input forwarding failed ({}), stopping {}", reason, spec.program);
                    let _ = killer.kill();
                    filter.await
                }
            },
            PtyInput::Idle(_) => filter.await,
        }
    };

    let filter_ok = match &filter_status {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!("colorizer {} exited with {}", config.command, status);
            false
        }
        Err(e) => {
            warn!("waiting for colorizer failed: {}", e);
            false
        }
    };
    // Nobody reads the pty once the filter is gone; a child still running
    // at that point would block on its next write.
    if !filter_ok && matches!(child.try_wait(), Ok(None)) {
        warn!("stopping {} after the colorizer went away", spec.program);
        let _ = killer.kill();
    }

    let child_status = wait_child(child).await;
    if pump_thread.join().is_err() {
        warn!("pty output thread panicked");
    }
    stop_input(input)?;

    check_pty_status(&spec.program, &child_status?)
}

/// What feeds the pty's input side for the length of one command
enum PtyInput {
    /// Keyboard bytes are copied in
    Forwarded(InputCopier),
    /// Held open and unused; closing the writer sends the child a newline
    /// and EOF.
    Idle(Box<dyn Write + Send>),
}

/// Set up the three moving parts around the pty.
///
/// Anything created before a failure is torn down by its own drop.
fn start_streams(
    spec: &CommandSpec,
    config: &ColorizerConfig,
    master: &SharedMaster,
) -> Result<(PtyInput, JoinHandle<u64>, Colorizer)> {
    let (reader, writer) = {
        let guard = lock_master(master)?;
        let reader = guard
            .try_clone_reader()
            .map_err(|e| Error::PtyReaderCloneFailed {
                reason: e.to_string(),
            })?;
        let writer = guard.take_writer().map_err(|e| Error::PtyWriterTakeFailed {
            reason: e.to_string(),
        })?;
        (reader, writer)
    };

    // Piped input belongs to the REPL, not to the child.
    let input = if terminal::stdin_is_tty() {
        PtyInput::Forwarded(InputCopier::from_stdin(writer)?)
    } else {
        PtyInput::Idle(writer)
    };

    let (tx, rx) = output_channel();
    let pump_thread = spawn_output_pump(reader, tx)?;
    let colorizer = Colorizer::spawn(config, &spec.env, rx)?;

    Ok((input, pump_thread, colorizer))
}

async fn wait_child(mut child: Box<dyn Child + Send + Sync>) -> Result<portable_pty::ExitStatus> {
    tokio::task::spawn_blocking(move || child.wait())
        .await
        .map_err(|e| Error::Other(format!("child wait task failed: {}", e)))?
        .map_err(Error::from)
}

async fn abandon_child(
    killer: &mut (dyn ChildKiller + Send + Sync),
    child: Box<dyn Child + Send + Sync>,
) {
    if let Err(e) = killer.kill() {
        debug!("kill after failed setup: {}", e);
    }
    if let Err(e) = wait_child(child).await {
        debug!("reaping abandoned child: {}", e);
    }
}

fn stop_input(input: PtyInput) -> Result<()> {
    match input {
        PtyInput::Forwarded(copier) => copier
            .stop()
            .map(|n| debug!("forwarded {} input bytes", n)),
        PtyInput::Idle(writer) => {
            drop(writer);
            Ok(())
        }
    }
}
