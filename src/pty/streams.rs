//! PTY output pump
//!
//! The pty master is blocking I/O, so a dedicated thread reads it and hands
//! chunks to async code over a bounded channel. A full channel blocks the
//! thread, which in turn stops reading the pty: back-pressure reaches the
//! child instead of growing a buffer.

use std::io::Read;
use std::thread;

use tokio::sync::mpsc::{self, Receiver, Sender};

/// Read size for each pty read
pub const READ_CHUNK_SIZE: usize = 4096;

/// Number of chunks that may wait between the pty and the colorizer
pub const OUTPUT_QUEUE_DEPTH: usize = 64;

/// Create the bounded channel the pump writes into
pub fn output_channel() -> (Sender<Vec<u8>>, Receiver<Vec<u8>>) {
    mpsc::channel(OUTPUT_QUEUE_DEPTH)
}

/// Spawn the thread copying `reader` into `tx` until EOF.
///
/// On Linux the master reports `EIO` once the last slave descriptor closes;
/// that is treated as end of output like a zero-length read. The thread also
/// stops when the receiving side goes away. Returns the number of bytes
/// forwarded.
pub fn spawn_output_pump(
    mut reader: Box<dyn Read + Send>,
    tx: Sender<Vec<u8>>,
) -> std::io::Result<thread::JoinHandle<u64>> {
    thread::Builder::new()
        .name("lolsh-pty-out".to_string())
        .spawn(move || {
            let mut buf = [0u8; READ_CHUNK_SIZE];
            let mut forwarded = 0u64;

            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!("pty read EOF");
                        break;
                    }
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            debug!("pty output receiver dropped, stopping pump");
                            break;
                        }
                        forwarded += n as u64;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        // EIO after the child hangs up is the normal end.
                        debug!("pty read ended: {}", e);
                        break;
                    }
                }
            }
            debug!("pty output pump exiting after {} bytes", forwarded);
            forwarded
        })
}
