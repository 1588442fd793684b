//! Line parsing
//!
//! Turns one raw input line into zero or more commands. The work is done in
//! small passes, each usable on its own:
//!
//! 1. [`split_statements`] breaks the line on newlines, then on `;`
//! 2. [`strip_comment`] drops everything from `#` onward
//! 3. [`tokenize`] splits a statement on whitespace
//! 4. [`expand_token`] resolves `$NAME` and a leading `~`
//!
//! [`parse_line`] runs them in that order.

use crate::env::Environment;

/// Separates statements on one line
pub const STATEMENT_SEPARATOR: char = ';';

/// Starts a comment that runs to the end of the statement
pub const COMMENT_MARKER: char = '#';

/// One command ready for dispatch. The argv is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    argv: Vec<String>,
}

impl ParsedCommand {
    /// Wrap an argv, refusing an empty one
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    /// Command name (first token)
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the command name
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// The full argv, name included
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn into_argv(self) -> Vec<String> {
        self.argv
    }
}

/// Split a raw line into trimmed, non-empty statements.
///
/// Newlines split first (multi-line paste), then `;` within each line.
/// Empty pieces from repeated separators are dropped.
pub fn split_statements(line: &str) -> Vec<&str> {
    line.split('\n')
        .flat_map(|l| l.split(STATEMENT_SEPARATOR))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Keep only the part of a statement before the comment marker.
///
/// Returns `None` when nothing but whitespace precedes it.
pub fn strip_comment(statement: &str) -> Option<&str> {
    let code = match statement.find(COMMENT_MARKER) {
        Some(idx) => &statement[..idx],
        None => statement,
    };
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Split a statement into raw tokens on whitespace
pub fn tokenize(statement: &str) -> Vec<&str> {
    statement.split_whitespace().collect()
}

/// Resolve one token against the environment.
///
/// A token starting with `$` becomes the value of the named variable
/// (empty if unset). Then one leading `~` is replaced with the home
/// directory.
pub fn expand_token(token: &str, env: &Environment) -> String {
    let value = match token.strip_prefix('$') {
        Some(name) => env.get_or_empty(name).to_string(),
        None => token.to_string(),
    };

    match value.strip_prefix('~') {
        Some(rest) => format!("{}{}", env.home().display(), rest),
        None => value,
    }
}

/// Turn one statement into a command; comments and blanks give `None`
pub fn parse_statement(statement: &str, env: &Environment) -> Option<ParsedCommand> {
    let code = strip_comment(statement)?;
    let argv = tokenize(code)
        .into_iter()
        .map(|token| expand_token(token, env))
        .collect();
    ParsedCommand::new(argv)
}

/// Parse a full input line into commands, in left-to-right order.
///
/// Every statement is expanded against the same `env`; the REPL instead
/// parses statement by statement so a `set` is visible to what follows.
pub fn parse_line(line: &str, env: &Environment) -> Vec<ParsedCommand> {
    split_statements(line)
        .into_iter()
        .filter_map(|statement| parse_statement(statement, env))
        .collect()
}
