//! lolsh - an interactive shell that pipes every command through lolcat

use std::env;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::process;

use anyhow::Context;

use lolsh::ansi::red;
use lolsh::config::is_truthy;
use lolsh::{Shell, NAME, VERSION};

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
enum CliAction {
    Run,
    Help,
    Version,
}

impl CliAction {
    /// Parse arguments (without the program name)
    fn parse<I, S>(args: I) -> std::result::Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut action = CliAction::Run;
        for arg in args {
            let arg = arg.as_ref();
            match arg.to_str() {
                Some("--help" | "-h") => action = CliAction::Help,
                Some("--version" | "-v") => action = CliAction::Version,
                _ => return Err(format!("unknown argument: {}", arg.to_string_lossy())),
            }
        }
        Ok(action)
    }
}

fn usage() -> String {
    format!(
        "{NAME} {VERSION} - a shell that colorizes everything\n\
         \n\
         USAGE:\n    {NAME} [OPTIONS]\n\
         \n\
         OPTIONS:\n    -h, --help       Print this help message\n    -v, --version    Print version information\n\
         \n\
         ENVIRONMENT:\n    NOLOL            Disable colorization for the session (1 or true)\n    LOLSH_DEBUG      Enable debug logging (1 or true)\n    RUST_LOG         Log filter, overrides LOLSH_DEBUG\n\
         \n\
         BUILTINS:\n    cd [path], exit, set KEY VALUE, time CMD..., nolol CMD..., history [PATTERN]"
    )
}

fn init_logging() {
    let level = if env::var("LOLSH_DEBUG").is_ok_and(|v| is_truthy(&v)) {
        "debug"
    } else {
        "warn"
    };
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(filter))
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn run_shell() -> anyhow::Result<()> {
    let mut shell = Shell::bootstrap(None).context("failed to start lolsh")?;
    shell
        .run_startup_script()
        .context("failed to run startup script")?;
    shell
        .run(io::stdin().lock(), io::stdout())
        .context("shell loop failed")?;
    Ok(())
}

fn main() {
    let action = match CliAction::parse(env::args_os().skip(1)) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}{}", red("error: "), e);
            eprintln!("{}", usage());
            process::exit(2);
        }
    };

    match action {
        CliAction::Help => {
            println!("{}", usage());
            return;
        }
        CliAction::Version => {
            println!("{} {}", NAME, VERSION);
            return;
        }
        CliAction::Run => {}
    }

    init_logging();
    tracing::debug!("starting {} {}", NAME, VERSION);

    if let Err(e) = run_shell() {
        let _ = io::stdout().flush();
        eprintln!("{}{:#}", red("error: "), e);
        process::exit(1);
    }
}
