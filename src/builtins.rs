//! Builtin command dispatch
//!
//! Builtins live in a static table mapping a name to a handler. Dispatch
//! looks the first word up in that table and falls through to the
//! [`CommandRunner`] when nothing matches, so the table can be tested with
//! a fake runner and no processes at all.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::parser::ParsedCommand;
use crate::runner::CommandRunner;
use crate::session::Session;

/// Per-invocation execution options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    /// Pipe external output through the colorizer
    pub colorize: bool,
}

/// Handler signature: the dispatcher (for builtins that re-enter dispatch),
/// the session, the arguments after the command name, and the options
pub type BuiltinHandler = fn(&Dispatcher, &mut Session, &[String], ExecOptions) -> Result<()>;

/// One entry of the builtin table
pub struct Builtin {
    pub name: &'static str,
    pub usage: &'static str,
    pub handler: BuiltinHandler,
}

/// Every builtin the shell knows
pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "cd",
        usage: "cd [path]",
        handler: builtin_cd,
    },
    Builtin {
        name: "exit",
        usage: "exit",
        handler: builtin_exit,
    },
    Builtin {
        name: "set",
        usage: "set KEY VALUE",
        handler: builtin_set,
    },
    Builtin {
        name: "time",
        usage: "time CMD...",
        handler: builtin_time,
    },
    Builtin {
        name: "nolol",
        usage: "nolol CMD...",
        handler: builtin_nolol,
    },
    Builtin {
        name: "history",
        usage: "history [PATTERN]",
        handler: builtin_history,
    },
];

/// Routes a command to a builtin or to the process runner
pub struct Dispatcher {
    table: HashMap<&'static str, &'static Builtin>,
    runner: Box<dyn CommandRunner>,
    out: RefCell<Box<dyn Write>>,
}

impl Dispatcher {
    /// Dispatcher writing builtin output to stdout
    pub fn new(runner: Box<dyn CommandRunner>) -> Self {
        Self::with_output(runner, Box::new(std::io::stdout()))
    }

    /// Dispatcher writing builtin output (`history`, `time`) to `out`
    pub fn with_output(runner: Box<dyn CommandRunner>, out: Box<dyn Write>) -> Self {
        let table = BUILTINS.iter().map(|b| (b.name, b)).collect();
        Self {
            table,
            runner,
            out: RefCell::new(out),
        }
    }

    /// Whether `name` is handled in-process
    pub fn is_builtin(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Look up a builtin's table entry
    pub fn builtin(&self, name: &str) -> Option<&'static Builtin> {
        self.table.get(name).copied()
    }

    /// Run one parsed command with the session's default options
    pub fn run(&self, session: &mut Session, command: &ParsedCommand) -> Result<()> {
        let opts = ExecOptions {
            colorize: session.colorize_default(),
        };
        self.dispatch(session, command.argv(), opts)
    }

    /// Run `argv` as a builtin if one matches, otherwise as a program
    pub fn dispatch(&self, session: &mut Session, argv: &[String], opts: ExecOptions) -> Result<()> {
        let Some((name, args)) = argv.split_first() else {
            return Ok(());
        };

        match self.table.get(name.as_str()) {
            Some(builtin) => {
                trace!("builtin {} {:?}", builtin.name, args);
                (builtin.handler)(self, session, args, opts)
            }
            None => self.runner.run(session, argv, opts.colorize),
        }
    }

    fn write_out(&self, text: &str) -> Result<()> {
        let mut out = self.out.borrow_mut();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// Run `f` and measure how long it took, whatever it returned
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

fn builtin_cd(_: &Dispatcher, session: &mut Session, args: &[String], _: ExecOptions) -> Result<()> {
    let target = match args {
        [] => session.env.home().to_path_buf(),
        [path] => PathBuf::from(path),
        _ => return Err(Error::arity("cd", "at most 1", args.len())),
    };
    session.change_dir(&target)
}

fn builtin_exit(_: &Dispatcher, session: &mut Session, args: &[String], _: ExecOptions) -> Result<()> {
    if !args.is_empty() {
        return Err(Error::arity("exit", "0", args.len()));
    }
    session.request_exit();
    Ok(())
}

fn builtin_set(_: &Dispatcher, session: &mut Session, args: &[String], _: ExecOptions) -> Result<()> {
    match args {
        [key, value] => {
            session.env.set(key.as_str(), value.as_str());
            Ok(())
        }
        _ => Err(Error::arity("set", "2", args.len())),
    }
}

fn builtin_time(
    dispatcher: &Dispatcher,
    session: &mut Session,
    args: &[String],
    opts: ExecOptions,
) -> Result<()> {
    if args.is_empty() {
        return Err(Error::arity("time", "at least 1", 0));
    }
    let (result, elapsed) = timed(|| dispatcher.dispatch(session, args, opts));
    dispatcher.write_out(&format!("{:?}\n", elapsed))?;
    result
}

fn builtin_nolol(
    dispatcher: &Dispatcher,
    session: &mut Session,
    args: &[String],
    _: ExecOptions,
) -> Result<()> {
    if args.is_empty() {
        return Err(Error::arity("nolol", "at least 1", 0));
    }
    dispatcher.dispatch(session, args, ExecOptions { colorize: false })
}

fn builtin_history(
    dispatcher: &Dispatcher,
    session: &mut Session,
    args: &[String],
    _: ExecOptions,
) -> Result<()> {
    let pattern = match args {
        [] => None,
        [pattern] => Some(pattern.as_str()),
        _ => return Err(Error::arity("history", "at most 1", args.len())),
    };
    let mut rendered = Vec::new();
    session.history.render(pattern, &mut rendered)?;
    dispatcher.write_out(&String::from_utf8_lossy(&rendered))
}
