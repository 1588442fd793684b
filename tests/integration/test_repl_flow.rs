//! Integration tests for the REPL loop
//!
//! These drive a bootstrapped shell with scripted input. Colorization is
//! turned off in the generated config so external commands run directly.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

use lolsh::{ReplState, Shell};
use tempfile::TempDir;

static CWD_LOCK: Mutex<()> = Mutex::new(());

const PLAIN_CONFIG: &str = r#"
[colorizer]
enabled = false
"#;

fn config_dir(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), config).unwrap();
    dir
}

fn run_script(shell: &mut Shell, input: &str) -> String {
    let mut out = Vec::new();
    shell.run(Cursor::new(input.to_string()), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn history_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_cd_then_pwd_in_child() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::current_dir().unwrap();
    let dir = config_dir(PLAIN_CONFIG);
    let out_file = dir.path().join("pwd.out");

    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();
    let script = format!("cd /tmp\n/bin/sh -c pwd>{}\nexit\n", out_file.display());
    run_script(&mut shell, &script);
    std::env::set_current_dir(&original).unwrap();

    let printed = fs::read_to_string(&out_file).unwrap();
    let tmp = fs::canonicalize("/tmp").unwrap();
    assert!(
        printed.trim() == "/tmp" || Path::new(printed.trim()) == tmp,
        "child saw {printed:?}"
    );
    assert_eq!(shell.state(), ReplState::Terminated);
}

#[test]
fn test_exit_flushes_history_and_stops_prompting() {
    let dir = config_dir(PLAIN_CONFIG);
    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();

    let prompts = run_script(&mut shell, "set A 1\nexit\nset B 2\n");

    assert_eq!(shell.state(), ReplState::Terminated);
    assert_eq!(prompts.matches("] $ ").count(), 2);
    assert_eq!(shell.session().env.get("B"), None);
    assert_eq!(
        history_lines(&dir.path().join("history")),
        vec!["set A 1", "exit"]
    );
}

#[test]
fn test_end_of_input_exits() {
    let dir = config_dir(PLAIN_CONFIG);
    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();

    let out = run_script(&mut shell, "");
    assert_eq!(shell.state(), ReplState::Terminated);
    assert_eq!(out.matches("] $ ").count(), 1);
    assert!(out.ends_with('\n'));
}

#[test]
fn test_errors_keep_the_loop_alive() {
    let dir = config_dir(PLAIN_CONFIG);
    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();

    run_script(
        &mut shell,
        "set ONLYKEY\nno-such-command-xyz\nexit now\n/bin/sh -c exit\nset OK yes\nexit\n",
    );
    assert_eq!(shell.state(), ReplState::Terminated);
    assert_eq!(shell.session().env.get("OK"), Some("yes"));
}

#[test]
fn test_startup_script_runs_before_prompt() {
    let dir = config_dir(PLAIN_CONFIG);
    fs::write(
        dir.path().join("lolshrc"),
        "# greeting for every session\nset GREETING hello\nset TARGET $GREETING\n",
    )
    .unwrap();

    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();
    shell.run_startup_script().unwrap();

    assert_eq!(shell.session().env.get("GREETING"), Some("hello"));
    assert_eq!(shell.session().env.get("TARGET"), Some("hello"));
    assert!(shell.session().history.is_empty());
    assert_eq!(shell.state(), ReplState::Running);
}

#[test]
fn test_startup_script_exit_skips_prompt() {
    let dir = config_dir(PLAIN_CONFIG);
    fs::write(dir.path().join("lolshrc"), "exit\nset NEVER 1\n").unwrap();

    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();
    shell.run_startup_script().unwrap();
    let out = run_script(&mut shell, "set TYPED 1\n");

    assert!(out.is_empty());
    assert_eq!(shell.state(), ReplState::Terminated);
    assert_eq!(shell.session().env.get("NEVER"), None);
    assert_eq!(shell.session().env.get("TYPED"), None);
}

#[test]
fn test_missing_startup_script_is_fine() {
    let dir = config_dir(PLAIN_CONFIG);
    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();
    assert!(shell.run_startup_script().is_ok());
}

#[test]
fn test_config_controls_history_file_and_colorizer() {
    let dir = config_dir(
        r#"
[colorizer]
command = "cat"
enabled = false

[shell]
history_file = "hist.txt"
"#,
    );
    let mut shell = Shell::bootstrap(Some(dir.path().to_path_buf())).unwrap();
    assert!(!shell.session().colorize_default());
    assert_eq!(shell.history_file(), Some(dir.path().join("hist.txt").as_path()));

    run_script(&mut shell, "set X 1\nexit\n");
    assert_eq!(
        history_lines(&dir.path().join("hist.txt")),
        vec!["set X 1", "exit"]
    );
}

#[test]
fn test_bootstrap_creates_config_dir() {
    let parent = tempfile::tempdir().unwrap();
    let dir = parent.path().join("nested").join("lolsh");
    let shell = Shell::bootstrap(Some(dir.clone())).unwrap();

    assert!(dir.is_dir());
    assert!(dir.join("history").is_file());
    assert_eq!(shell.session().env.get("SHELL"), Some("lolsh"));
}
