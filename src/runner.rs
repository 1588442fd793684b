//! External command execution
//!
//! [`ProcessRunner`] starts programs that are not builtins. Without
//! colorization the child simply inherits the shell's terminal; with it the
//! child runs behind a pty and its output goes through the colorizer (see
//! [`crate::pty::bridge`]).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::sys::signal::Signal;
use tokio::runtime::Runtime;
use tokio::signal::unix::{signal, SignalKind};

use crate::config::ColorizerConfig;
use crate::error::{Error, Result};
use crate::session::Session;

/// Seam between dispatch and process execution
pub trait CommandRunner {
    /// Run `argv[0]` with `argv[1..]`, colorized or not.
    ///
    /// A nonzero exit comes back as an error for the caller to report.
    fn run(&self, session: &Session, argv: &[String], colorize: bool) -> Result<()>;
}

/// Everything needed to start one child process
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program name as typed
    pub program: String,
    /// Resolved executable path
    pub path: PathBuf,
    /// Arguments after the program name
    pub args: Vec<String>,
    /// Complete environment for the child
    pub env: HashMap<String, String>,
    /// Working directory for the child
    pub cwd: PathBuf,
}

impl CommandSpec {
    /// Resolve `argv[0]` against the session's PATH
    pub fn from_session(session: &Session, argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or(Error::CommandNotFound {
            command: String::new(),
        })?;

        let path = find_program(program, session.env.get("PATH")).ok_or_else(|| {
            Error::CommandNotFound {
                command: program.clone(),
            }
        })?;

        Ok(Self {
            program: program.clone(),
            path,
            args: args.to_vec(),
            env: session.env.vars().clone(),
            cwd: session.cwd(),
        })
    }
}

/// Locate an executable the way `execvp` would.
///
/// Names containing `/` are taken as paths; anything else is searched for
/// in each `PATH` entry.
pub fn find_program(name: &str, path_var: Option<&str>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains('/') {
        let candidate = PathBuf::from(name);
        return is_executable(&candidate).then_some(candidate);
    }
    path_var?
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Map a spawn failure onto the error taxonomy
pub(crate) fn spawn_error(command: &str, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::CommandNotFound {
            command: command.to_string(),
        }
    } else {
        Error::CommandSpawnFailed {
            command: command.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Turn a finished child's status into `Ok` or a child exit error
pub fn check_status(command: &str, status: std::process::ExitStatus) -> Result<()> {
    use std::os::unix::process::ExitStatusExt;

    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        Err(Error::CommandFailed {
            command: command.to_string(),
            code,
        })
    } else if let Some(signal) = status.signal() {
        Err(Error::CommandSignaled {
            command: command.to_string(),
            signal,
        })
    } else {
        Err(Error::CommandFailed {
            command: command.to_string(),
            code: -1,
        })
    }
}

/// Map a pty child's exit status the way [`check_status`] maps a direct one
pub fn check_pty_status(command: &str, status: &portable_pty::ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    match status.signal().map(|name| (name, signal_number(name))) {
        Some((_, Some(signal))) => Err(Error::CommandSignaled {
            command: command.to_string(),
            signal,
        }),
        Some((name, None)) => {
            debug!("{} ended on unrecognised signal {:?}", command, name);
            Err(Error::CommandFailed {
                command: command.to_string(),
                code: status.exit_code() as i32,
            })
        }
        None => Err(Error::CommandFailed {
            command: command.to_string(),
            code: status.exit_code() as i32,
        }),
    }
}

/// Signal number for a name as portable-pty reports it.
///
/// portable-pty stores the `strsignal(3)` text ("Killed"), or "Signal N"
/// when libc has none; `SIGKILL` style names are accepted too.
fn signal_number(name: &str) -> Option<i32> {
    if let Ok(signal) = name.parse::<Signal>() {
        return Some(signal as i32);
    }
    if let Some(number) = name.strip_prefix("Signal ") {
        return number.trim().parse().ok();
    }
    Signal::iterator()
        .find(|signal| describe_signal(*signal).as_deref() == Some(name))
        .map(|signal| signal as i32)
}

fn describe_signal(signal: Signal) -> Option<String> {
    // SAFETY: strsignal returns null or a NUL-terminated string, copied out
    // before anything else can overwrite it.
    unsafe {
        let text = libc::strsignal(signal as libc::c_int);
        if text.is_null() {
            None
        } else {
            Some(std::ffi::CStr::from_ptr(text).to_string_lossy().into_owned())
        }
    }
}

/// Acknowledges SIGINT while a foreground command runs.
///
/// The shell never dies from an interrupt; the terminal delivers it to the
/// child on its own, and the shell only notes it and keeps waiting.
#[derive(Clone)]
pub struct InterruptAck {
    busy: Arc<AtomicBool>,
}

impl InterruptAck {
    /// Take over SIGINT for the lifetime of `runtime`
    pub fn install(runtime: &Runtime) -> Result<Self> {
        let busy = Arc::new(AtomicBool::new(false));
        let mut sigint = runtime.block_on(async { signal(SignalKind::interrupt()) })?;

        let flag = Arc::clone(&busy);
        runtime.spawn(async move {
            while sigint.recv().await.is_some() {
                if flag.load(Ordering::SeqCst) {
                    eprint!("\r\n^C (interrupt passed to foreground command)\r\n");
                } else {
                    debug!("SIGINT at prompt ignored");
                }
            }
        });

        Ok(Self { busy })
    }

    /// Mark a foreground command as running until the scope is dropped
    pub fn foreground(&self) -> ForegroundScope {
        self.busy.store(true, Ordering::SeqCst);
        ForegroundScope {
            busy: Arc::clone(&self.busy),
        }
    }
}

/// Clears the foreground flag on drop
pub struct ForegroundScope {
    busy: Arc<AtomicBool>,
}

impl Drop for ForegroundScope {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Runs external programs on a private tokio runtime
pub struct ProcessRunner {
    runtime: Runtime,
    interrupts: InterruptAck,
    colorizer: ColorizerConfig,
}

impl ProcessRunner {
    /// Create a runner that colorizes through `colorizer`
    pub fn new(colorizer: ColorizerConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("lolsh-io")
            .enable_all()
            .build()?;
        let interrupts = InterruptAck::install(&runtime)?;
        Ok(Self {
            runtime,
            interrupts,
            colorizer,
        })
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, session: &Session, argv: &[String], colorize: bool) -> Result<()> {
        let spec = CommandSpec::from_session(session, argv)?;
        let _foreground = self.interrupts.foreground();

        debug!(
            "running {} {:?} (colorize: {})",
            spec.path.display(),
            spec.args,
            colorize
        );
        if colorize {
            self.runtime
                .block_on(crate::pty::bridge::run_colorized(&spec, &self.colorizer))
        } else {
            self.runtime.block_on(run_direct(&spec))
        }
    }
}

/// Run a child attached directly to the shell's own standard streams
pub async fn run_direct(spec: &CommandSpec) -> Result<()> {
    let mut child = tokio::process::Command::new(&spec.path)
        .arg0(&spec.program)
        .args(&spec.args)
        .env_clear()
        .envs(&spec.env)
        .current_dir(&spec.cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| spawn_error(&spec.program, e))?;

    let status = child.wait().await?;
    debug!("{} exited with {}", spec.program, status);
    check_status(&spec.program, status)
}
