//! Generic table-driven lexer.
//!
//! - [`grammar`]: the declarative table (states, rules, actions, transitions).
//! - [`table`]: validation and compilation into an immutable [`LexTable`].
//! - [`engine`]: the state-stack driver producing a lazy [`TokenStream`].

pub mod engine;
pub mod grammar;
pub mod table;

pub use engine::{tokenize, LexerContext, TokenStream, MAX_SUBLEX_DEPTH};
pub use grammar::{
    include, words, Action, Entry, Flags, Grammar, GroupAction, Lint, LintKind, RuleDef,
    StateDef, Transition, Words,
};
pub use table::{LexTable, StateId};
