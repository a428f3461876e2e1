//! Shadow Lexer Error Handling
//!
//! Two families of errors exist and they never mix:
//!
//! - [`ConfigError`]: a grammar failed to load. Raised once, by
//!   [`Grammar::compile`](crate::lexer::Grammar::compile), never while tokenizing.
//! - [`CliError`]: the command-line front end could not read input or resolve a
//!   language.
//!
//! Tokenization itself is total and has no error type. Unrecognized input
//! degrades to [`TokenKind::Error`](crate::TokenKind::Error) tokens.

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// GRAMMAR CONFIGURATION ERRORS
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("grammar `{grammar}` has no initial state `{state}`")]
    #[diagnostic(
        code(shadow::config::missing_initial_state),
        help("declare the state or change the grammar's initial state")
    )]
    MissingInitialState { grammar: String, state: String },

    #[error("state `{state}` is declared more than once")]
    #[diagnostic(code(shadow::config::duplicate_state))]
    DuplicateState { state: String },

    #[error("state `{from}` refers to undefined state `{target}`")]
    #[diagnostic(
        code(shadow::config::undefined_state),
        help("every pushed, included or sub-lexed state must be declared in the grammar")
    )]
    UndefinedState { from: String, target: String },

    #[error("include cycle through state `{state}`")]
    #[diagnostic(code(shadow::config::include_cycle))]
    IncludeCycle { state: String },

    #[error("invalid pattern in state `{state}`, rule {index}: {message}")]
    #[diagnostic(code(shadow::config::invalid_pattern))]
    InvalidPattern {
        state: String,
        index: usize,
        message: String,
        #[source_code]
        pattern: NamedSource<String>,
        #[label("does not compile")]
        span: SourceSpan,
    },

    #[error("pattern in state `{state}`, rule {index} can match the empty string")]
    #[diagnostic(
        code(shadow::config::empty_match),
        help("rules must consume input; use the state's fallback transition for empty matches")
    )]
    EmptyMatch {
        state: String,
        index: usize,
        #[source_code]
        pattern: NamedSource<String>,
        #[label("may match nothing")]
        span: SourceSpan,
    },

    #[error(
        "rule {index} in state `{state}` maps {actions} groups but its pattern has only {groups}"
    )]
    #[diagnostic(code(shadow::config::group_count))]
    GroupCountMismatch {
        state: String,
        index: usize,
        actions: usize,
        groups: usize,
    },

    #[error("rule {index} in state `{state}` pops zero states")]
    #[diagnostic(code(shadow::config::zero_pop), help("use no transition instead of `Pop(0)`"))]
    ZeroPop { state: String, index: usize },
}

impl ConfigError {
    pub(crate) fn invalid_pattern(
        state: &str,
        index: usize,
        pattern: &str,
        message: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidPattern {
            state: state.to_string(),
            index,
            message: message.into(),
            pattern: pattern_source(state, index, pattern),
            span: (0..pattern.len()).into(),
        }
    }

    pub(crate) fn empty_match(state: &str, index: usize, pattern: &str) -> Self {
        ConfigError::EmptyMatch {
            state: state.to_string(),
            index,
            pattern: pattern_source(state, index, pattern),
            span: (0..pattern.len()).into(),
        }
    }
}

fn pattern_source(state: &str, index: usize, pattern: &str) -> NamedSource<String> {
    NamedSource::new(format!("{state}[{index}]"), pattern.to_string())
}

// ============================================================================
// COMMAND-LINE ERRORS
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("could not read `{}`", .path.display())]
    #[diagnostic(code(shadow::cli::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write output")]
    #[diagnostic(code(shadow::cli::io))]
    Write(#[from] std::io::Error),

    #[error("no lexer registered for `{0}`")]
    #[diagnostic(
        code(shadow::cli::unknown_lexer),
        help("run `shadowlex languages` to list the registered lexers")
    )]
    UnknownLexer(String),

    #[error("invalid lexer option `{0}`")]
    #[diagnostic(
        code(shadow::cli::option),
        help("options are given as key=value, e.g. `-O ensure_nl=true`")
    )]
    InvalidOption(String),

    #[error("invalid theme file `{}`", .path.display())]
    #[diagnostic(code(shadow::cli::theme))]
    Theme {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} grammar lint finding(s)")]
    #[diagnostic(code(shadow::cli::lint))]
    Lint(usize),
}
