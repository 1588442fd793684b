//! Colorizing filter process
//!
//! The filter is an ordinary program (`lolcat` by default) that reads the
//! pty's output on stdin and writes straight to the shell's stdout. A feeder
//! task moves chunks from the output channel into the filter's stdin and
//! closes it when the channel ends, which is how the filter learns the
//! command has finished.

use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;

use crate::config::ColorizerConfig;
use crate::error::{Error, Result};

/// A running filter and the task feeding it
pub struct Colorizer {
    command: String,
    child: Child,
    feeder: JoinHandle<u64>,
}

impl Colorizer {
    /// Start the filter and begin feeding it from `output`
    pub fn spawn(
        config: &ColorizerConfig,
        env: &HashMap<String, String>,
        output: Receiver<Vec<u8>>,
    ) -> Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .env_clear()
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ColorizerSpawnFailed {
                command: config.command.clone(),
                reason: e.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| Error::ColorizerSpawnFailed {
            command: config.command.clone(),
            reason: "stdin not captured".to_string(),
        })?;
        debug!("colorizer {} started (pid {:?})", config.command, child.id());

        Ok(Self {
            command: config.command.clone(),
            child,
            feeder: tokio::spawn(feed(stdin, output)),
        })
    }

    /// Wait for the feeder to drain and the filter to exit
    pub async fn wait(mut self) -> Result<ExitStatus> {
        let fed = self.feeder.await.unwrap_or_else(|e| {
            warn!("colorizer feeder failed: {}", e);
            0
        });
        let status = self.child.wait().await?;
        debug!("colorizer {} exited with {} after {} bytes", self.command, status, fed);
        Ok(status)
    }
}

async fn feed(mut stdin: ChildStdin, mut output: Receiver<Vec<u8>>) -> u64 {
    let mut fed = 0u64;
    while let Some(chunk) = output.recv().await {
        if let Err(e) = stdin.write_all(&chunk).await {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                debug!("colorizer closed its input");
            } else {
                warn!("writing to colorizer failed: {}", e);
            }
            break;
        }
        fed += chunk.len() as u64;
    }
    // Closing stdin is what lets the filter finish.
    let _ = stdin.shutdown().await;
    fed
}
