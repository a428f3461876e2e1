//! Input preprocessing options.
//!
//! All options are off by default, in which case [`LexerOptions::prepare`]
//! returns the input untouched and the token stream reproduces it exactly.

use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LexerOptions {
    /// Strip leading and trailing newlines.
    pub strip_nl: bool,
    /// Strip all leading and trailing whitespace. Implies `strip_nl`.
    pub strip_all: bool,
    /// Append a final `\n` if the input does not end with one.
    pub ensure_nl: bool,
    /// Expand tabs to this many spaces when non-zero.
    pub tab_size: usize,
    /// Convert `\r\n` and lone `\r` to `\n`.
    pub normalize_newlines: bool,
}

impl LexerOptions {
    /// True if [`prepare`](Self::prepare) can only return its input.
    pub fn is_lossless(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the options in a fixed order: newlines, tabs, stripping, final newline.
    pub fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(text);
        if self.normalize_newlines && text.contains('\r') {
            text = Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"));
        }
        if self.tab_size > 0 && text.contains('\t') {
            text = Cow::Owned(text.replace('\t', &" ".repeat(self.tab_size)));
        }
        if self.strip_all {
            text = trim_cow(text, |t| t.trim());
        } else if self.strip_nl {
            text = trim_cow(text, |t| t.trim_matches('\n'));
        }
        if self.ensure_nl && !text.ends_with('\n') {
            text.to_mut().push('\n');
        }
        text
    }

    /// Set one option from its `key=value` command-line form.
    pub fn set(&mut self, assignment: &str) -> Result<(), String> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| assignment.to_string())?;
        let flag = || parse_bool(value).ok_or_else(|| assignment.to_string());
        match key.trim() {
            "strip_nl" | "stripnl" => self.strip_nl = flag()?,
            "strip_all" | "stripall" => self.strip_all = flag()?,
            "ensure_nl" | "ensurenl" => self.ensure_nl = flag()?,
            "normalize_newlines" => self.normalize_newlines = flag()?,
            "tab_size" | "tabsize" => {
                self.tab_size = value.trim().parse().map_err(|_| assignment.to_string())?
            }
            _ => return Err(assignment.to_string()),
        }
        Ok(())
    }
}

impl FromStr for LexerOptions {
    type Err = String;

    /// Comma-separated `key=value` list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut options = LexerOptions::default();
        for assignment in s.split(',').filter(|part| !part.trim().is_empty()) {
            options.set(assignment)?;
        }
        Ok(options)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn trim_cow<'a>(text: Cow<'a, str>, trim: impl Fn(&str) -> &str) -> Cow<'a, str> {
    match text {
        Cow::Borrowed(borrowed) => Cow::Borrowed(trim(borrowed)),
        Cow::Owned(owned) => Cow::Owned(trim(&owned).to_string()),
    }
}
