//! Unit tests for line parsing
//!
//! Each pass is checked on its own, then composed through `parse_line`.

use lolsh::env::Environment;
use lolsh::parser::{
    expand_token, parse_line, parse_statement, split_statements, strip_comment, tokenize,
};

fn env() -> Environment {
    Environment::with_vars(
        [("USER", "alice"), ("EDITOR", "vim"), ("EMPTY", "")],
        "/home/alice",
    )
}

fn argvs(line: &str) -> Vec<Vec<String>> {
    parse_line(line, &env())
        .into_iter()
        .map(|cmd| cmd.into_argv())
        .collect()
}

#[test]
fn test_blank_and_comment_lines_yield_nothing() {
    for line in ["", "   ", "\t\n", "#", "# only a comment", "   # indented", ";;;", "\n\n"] {
        assert!(argvs(line).is_empty(), "{line:?} produced commands");
    }
}

#[test]
fn test_separators_keep_order() {
    assert_eq!(
        argvs("echo one; echo two ;echo three"),
        vec![
            vec!["echo", "one"],
            vec!["echo", "two"],
            vec!["echo", "three"]
        ]
    );
}

#[test]
fn test_repeated_separators_are_dropped() {
    assert_eq!(argvs("ls;;; ;pwd"), vec![vec!["ls"], vec!["pwd"]]);
}

#[test]
fn test_newlines_split_statements() {
    assert_eq!(
        argvs("cd /tmp\nls -la\n"),
        vec![vec!["cd", "/tmp"], vec!["ls", "-la"]]
    );
}

#[test]
fn test_trailing_comment_is_stripped() {
    assert_eq!(argvs("ls -la # list everything"), vec![vec!["ls", "-la"]]);
    assert_eq!(strip_comment("ls #x"), Some("ls"));
    assert_eq!(strip_comment("#x"), None);
    assert_eq!(strip_comment("   "), None);
}

#[test]
fn test_comment_applies_per_statement() {
    // The separator splits first, so a later statement survives.
    assert_eq!(argvs("ls # note; pwd"), vec![vec!["ls"], vec!["pwd"]]);
}

#[test]
fn test_variable_expansion() {
    assert_eq!(argvs("echo $USER $EDITOR"), vec![vec!["echo", "alice", "vim"]]);
}

#[test]
fn test_unset_variable_is_empty() {
    let env = env();
    assert_eq!(expand_token("$NOPE", &env), "");
    assert_eq!(expand_token("$EMPTY", &env), "");
    assert_eq!(argvs("echo $NOPE"), vec![vec!["echo", ""]]);
}

#[test]
fn test_tilde_expansion() {
    let env = env();
    assert_eq!(expand_token("~", &env), "/home/alice");
    assert_eq!(expand_token("~/src", &env), "/home/alice/src");
    // Only a leading tilde, and only once.
    assert_eq!(expand_token("a~b", &env), "a~b");
    assert_eq!(expand_token("~~", &env), "/home/alice~");
}

#[test]
fn test_tilde_inside_variable_value() {
    let env = Environment::with_vars([("DIR", "~/work")], "/home/bob");
    assert_eq!(expand_token("$DIR", &env), "/home/bob/work");
}

#[test]
fn test_tokenize_collapses_whitespace() {
    assert_eq!(tokenize("  ls \t -l   /  "), vec!["ls", "-l", "/"]);
}

#[test]
fn test_split_statements_trims() {
    assert_eq!(split_statements("  a ; b\nc  "), vec!["a", "b", "c"]);
}

#[test]
fn test_parse_statement() {
    let cmd = parse_statement("git commit -m $USER", &env()).unwrap();
    assert_eq!(cmd.name(), "git");
    assert_eq!(cmd.args(), ["commit", "-m", "alice"]);
    assert!(parse_statement("# nothing", &env()).is_none());
}
