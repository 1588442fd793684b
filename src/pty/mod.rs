//! Pseudoterminal (PTY) Management
//!
//! Everything needed to run one external command behind a pty while its
//! output is piped through the colorizer.

pub mod bridge;
pub mod colorizer;
pub mod copier;
pub mod process;
pub mod resize;
pub mod streams;

pub use bridge::run_colorized;
pub use colorizer::Colorizer;
pub use copier::InputCopier;
pub use process::{spawn_pty_process, PtySession, SharedMaster};
pub use resize::{sync_size, ResizeForwarder};
pub use streams::{output_channel, spawn_output_pump};
