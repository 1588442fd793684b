//! Terminal input forwarding
//!
//! [`InputCopier`] copies keystrokes from the real terminal to the pty
//! master on its own thread. Reads are gated by `poll(2)` with a short
//! timeout so the thread notices a stop request without a pending `read`
//! swallowing the next keystroke meant for the prompt.

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, OwnedFd};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// How long one poll waits before re-checking for a stop request
pub const POLL_INTERVAL_MS: u16 = 50;

const INPUT_CHUNK_SIZE: usize = 1024;

/// Handle to the running input-copy thread
pub struct InputCopier {
    stop_tx: SyncSender<()>,
    failed_rx: Option<oneshot::Receiver<String>>,
    handle: Option<thread::JoinHandle<Result<u64>>>,
}

impl InputCopier {
    /// Start copying from a duplicate of standard input into `sink`
    pub fn from_stdin(sink: Box<dyn Write + Send>) -> Result<Self> {
        let source = std::io::stdin().as_fd().try_clone_to_owned()?;
        Self::spawn(source, sink)
    }

    /// Start copying from `source` into `sink`
    pub fn spawn(source: OwnedFd, sink: Box<dyn Write + Send>) -> Result<Self> {
        let (stop_tx, stop_rx) = mpsc::sync_channel(1);
        let (failed_tx, failed_rx) = oneshot::channel();

        let handle = thread::Builder::new()
            .name("lolsh-pty-in".to_string())
            .spawn(move || {
                let result = copy_until_stopped(File::from(source), sink, &stop_rx);
                if let Err(e) = &result {
                    let _ = failed_tx.send(e.to_string());
                }
                result
            })?;

        Ok(Self {
            stop_tx,
            failed_rx: Some(failed_rx),
            handle: Some(handle),
        })
    }

    /// Resolves with a reason if copying failed; never resolves otherwise
    pub async fn failed(&mut self) -> String {
        let outcome = match self.failed_rx.as_mut() {
            Some(rx) => rx.await.ok(),
            None => None,
        };
        self.failed_rx = None;
        match outcome {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }

    /// Signal the thread to stop and wait for it.
    ///
    /// Returns the byte count copied, or the error that ended copying.
    pub fn stop(mut self) -> Result<u64> {
        self.join()
    }

    fn join(&mut self) -> Result<u64> {
        let _ = self.stop_tx.try_send(());
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::Other("input copier panicked".to_string()))?,
            None => Ok(0),
        }
    }
}

impl Drop for InputCopier {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.join();
        }
    }
}

fn copy_until_stopped(
    mut source: File,
    mut sink: Box<dyn Write + Send>,
    stop_rx: &Receiver<()>,
) -> Result<u64> {
    let mut buf = [0u8; INPUT_CHUNK_SIZE];
    let mut copied = 0u64;

    loop {
        match stop_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                debug!("input copier stopped after {} bytes", copied);
                return Ok(copied);
            }
            Err(TryRecvError::Empty) => {}
        }

        let mut fds = [PollFd::new(source.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(POLL_INTERVAL_MS)) {
            Ok(0) => continue,
            Ok(_) => {}
            Err(Errno::EINTR) => continue,
            Err(e) => {
                return Err(Error::InputForwardFailed {
                    reason: e.to_string(),
                })
            }
        }

        let revents = fds[0].revents().unwrap_or(PollFlags::empty());
        if !revents.contains(PollFlags::POLLIN)
            && revents.intersects(PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL)
        {
            debug!("input source hung up");
            return Ok(copied);
        }

        let n = match source.read(&mut buf) {
            Ok(0) => {
                debug!("input EOF after {} bytes", copied);
                return Ok(copied);
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::InputForwardFailed {
                    reason: e.to_string(),
                })
            }
        };

        let written = sink.write(&buf[..n]).map_err(|e| Error::InputForwardFailed {
            reason: e.to_string(),
        })?;
        if written != n {
            return Err(Error::ShortWrite {
                written,
                expected: n,
            });
        }
        sink.flush().map_err(|e| Error::InputForwardFailed {
            reason: e.to_string(),
        })?;
        copied += n as u64;
    }
}
