//! ANSI color helpers
//!
//! Small helpers for the few places where the shell itself paints text:
//! the prompt and the `error:` prefix. Command output is never touched here;
//! that goes through the external colorizer.

use regex::Regex;
use std::sync::OnceLock;

/// Foreground colors used by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Blue => 34,
        }
    }
}

/// Wrap `text` in the escape sequence for `color` followed by a reset
pub fn paint(text: &str, color: Color) -> String {
    format!("\x1b[{}m{}\x1b[0m", color.code(), text)
}

/// Shorthand for the error prefix color
pub fn red(text: &str) -> String {
    paint(text, Color::Red)
}

fn escape_regex() -> &'static Regex {
    static ESCAPE: OnceLock<Regex> = OnceLock::new();
    ESCAPE.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("static ANSI pattern is valid")
    })
}

/// Remove CSI escape sequences, leaving only the visible text
pub fn strip_ansi(text: &str) -> String {
    escape_regex().replace_all(text, "").into_owned()
}
