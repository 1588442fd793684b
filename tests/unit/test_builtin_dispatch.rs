//! Unit tests for the builtin table and dispatch
//!
//! A recording runner stands in for process execution so these tests never
//! spawn anything. Tests that change the process working directory hold
//! `CWD_LOCK` since the cwd is shared by every test thread.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;

use lolsh::builtins::{Dispatcher, ExecOptions, BUILTINS};
use lolsh::config::Config;
use lolsh::env::Environment;
use lolsh::history::HistoryManager;
use lolsh::runner::CommandRunner;
use lolsh::session::Session;
use lolsh::{Error, Result};

static CWD_LOCK: Mutex<()> = Mutex::new(());

type Calls = Rc<RefCell<Vec<(Vec<String>, bool)>>>;

struct RecordingRunner {
    calls: Calls,
    fail_with: Option<i32>,
}

impl CommandRunner for RecordingRunner {
    fn run(&self, _session: &Session, argv: &[String], colorize: bool) -> Result<()> {
        self.calls.borrow_mut().push((argv.to_vec(), colorize));
        match self.fail_with {
            Some(code) => Err(Error::CommandFailed {
                command: argv[0].clone(),
                code,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
struct Output(Rc<RefCell<Vec<u8>>>);

impl Output {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct Fixture {
    dispatcher: Dispatcher,
    session: Session,
    calls: Calls,
    output: Output,
}

impl Fixture {
    fn new(home: PathBuf) -> Self {
        Self::with_runner_failure(home, None)
    }

    fn with_runner_failure(home: PathBuf, fail_with: Option<i32>) -> Self {
        let calls = Calls::default();
        let output = Output::default();
        let dispatcher = Dispatcher::with_output(
            Box::new(RecordingRunner {
                calls: Rc::clone(&calls),
                fail_with,
            }),
            Box::new(output.clone()),
        );
        let env = Environment::with_vars(
            [("HOME", home.to_string_lossy().into_owned())],
            home.clone(),
        );
        let session = Session::new(env, HistoryManager::in_memory(100), &Config::default());
        Self {
            dispatcher,
            session,
            calls,
            output,
        }
    }

    fn dispatch(&mut self, words: &[&str]) -> Result<()> {
        let argv: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        self.dispatcher
            .dispatch(&mut self.session, &argv, ExecOptions { colorize: true })
    }
}

fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn test_builtin_table_names() {
    let names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
    assert_eq!(names, ["cd", "exit", "set", "time", "nolol", "history"]);
    for builtin in BUILTINS {
        assert!(builtin.usage.starts_with(builtin.name));
    }
}

#[test]
fn test_cd_without_args_goes_home() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::current_dir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let home_path = home.path().canonicalize().unwrap();
    let mut fx = Fixture::new(home_path.clone());

    fx.dispatch(&["cd"]).unwrap();
    assert_eq!(std::env::current_dir().unwrap(), home_path);
    assert_eq!(fx.session.env.get("PWD"), Some(home_path.to_str().unwrap()));

    std::env::set_current_dir(original).unwrap();
}

#[test]
fn test_cd_to_path_updates_pwd() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::current_dir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let target_path = target.path().canonicalize().unwrap();
    let mut fx = Fixture::new(PathBuf::from("/"));

    fx.dispatch(&["cd", target_path.to_str().unwrap()]).unwrap();
    assert_eq!(std::env::current_dir().unwrap(), target_path);
    assert_eq!(fx.session.env.get("PWD"), Some(target_path.to_str().unwrap()));
    assert_eq!(fx.session.cwd(), target_path);

    std::env::set_current_dir(original).unwrap();
}

#[test]
fn test_cd_arity_error_leaves_cwd() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let before = std::env::current_dir().unwrap();
    let mut fx = Fixture::new(PathBuf::from("/"));

    let err = fx.dispatch(&["cd", "/tmp", "/usr"]).unwrap_err();
    assert!(err.is_argument_error());
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
fn test_cd_missing_dir_reports_os_error() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let before = std::env::current_dir().unwrap();
    let mut fx = Fixture::new(PathBuf::from("/"));
    let pwd_before = fx.session.env.get("PWD").map(str::to_string);

    let err = fx.dispatch(&["cd", "/no/such/directory/here"]).unwrap_err();
    assert!(matches!(err, Error::DirectoryChange { .. }));
    assert!(!err.is_argument_error());
    assert_eq!(std::env::current_dir().unwrap(), before);
    assert_eq!(fx.session.env.get("PWD").map(str::to_string), pwd_before);
}

#[test]
fn test_exit_sets_flag_only_without_args() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    assert!(fx.dispatch(&["exit", "0"]).unwrap_err().is_argument_error());
    assert!(!fx.session.exit_requested());

    fx.dispatch(&["exit"]).unwrap();
    assert!(fx.session.exit_requested());
}

#[test]
fn test_set_requires_exactly_two() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    fx.dispatch(&["set", "EDITOR", "vim"]).unwrap();
    assert_eq!(fx.session.env.get("EDITOR"), Some("vim"));

    assert!(fx.dispatch(&["set", "EDITOR"]).unwrap_err().is_argument_error());
    assert!(fx
        .dispatch(&["set", "EDITOR", "nano", "extra"])
        .unwrap_err()
        .is_argument_error());
    assert_eq!(fx.session.env.get("EDITOR"), Some("vim"));
}

#[test]
fn test_external_commands_reach_runner() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    fx.dispatch(&["grep", "-r", "todo", "."]).unwrap();
    assert_eq!(
        fx.calls.borrow().as_slice(),
        [(argv(&["grep", "-r", "todo", "."]), true)]
    );
}

#[test]
fn test_time_runs_exactly_once_and_reports() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    fx.dispatch(&["time", "make", "-j4"]).unwrap();

    assert_eq!(fx.calls.borrow().len(), 1);
    assert_eq!(fx.calls.borrow()[0].0, argv(&["make", "-j4"]));
    let report = fx.output.text();
    assert_eq!(report.lines().count(), 1);
    // Duration debug output always ends in a unit.
    assert!(report.trim_end().ends_with('s'), "unexpected report {report:?}");
}

#[test]
fn test_time_reports_even_when_command_fails() {
    let mut fx = Fixture::with_runner_failure(PathBuf::from("/"), Some(2));
    let err = fx.dispatch(&["time", "false"]).unwrap_err();

    assert!(matches!(err, Error::CommandFailed { code: 2, .. }));
    assert!(err.is_child_exit());
    assert!(!fx.output.text().is_empty());
}

#[test]
fn test_time_alone_is_an_arity_error() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    assert!(fx.dispatch(&["time"]).unwrap_err().is_argument_error());
    assert!(fx.calls.borrow().is_empty());
    assert!(fx.output.text().is_empty());
}

#[test]
fn test_time_of_builtin() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    fx.dispatch(&["time", "set", "A", "1"]).unwrap();
    assert_eq!(fx.session.env.get("A"), Some("1"));
    assert!(fx.calls.borrow().is_empty());
}

#[test]
fn test_nolol_disables_colorizer_for_one_command() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    fx.dispatch(&["nolol", "htop"]).unwrap();
    fx.dispatch(&["htop"]).unwrap();

    assert_eq!(
        fx.calls.borrow().as_slice(),
        [(argv(&["htop"]), false), (argv(&["htop"]), true)]
    );
    assert!(fx.dispatch(&["nolol"]).unwrap_err().is_argument_error());
}

#[test]
fn test_history_lists_and_filters() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    for entry in ["ls", "cargo build", "cd /tmp", "cargo test"] {
        fx.session.history.add(entry).unwrap();
    }

    fx.dispatch(&["history"]).unwrap();
    assert_eq!(
        fx.output.text(),
        "    1  ls\n    2  cargo build\n    3  cd /tmp\n    4  cargo test\n"
    );

    fx.output.0.borrow_mut().clear();
    fx.dispatch(&["history", "^cargo"]).unwrap();
    assert_eq!(fx.output.text(), "    2  cargo build\n    4  cargo test\n");
}

#[test]
fn test_history_invalid_pattern() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    let err = fx.dispatch(&["history", "[unclosed"]).unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
    assert!(fx.dispatch(&["history", "a", "b"]).unwrap_err().is_argument_error());
}

#[test]
fn test_empty_argv_is_ignored() {
    let mut fx = Fixture::new(PathBuf::from("/"));
    fx.dispatch(&[]).unwrap();
    assert!(fx.calls.borrow().is_empty());
}
