//! Shadow: a table-driven lexer for highlighting Shadow source code.
//!
//! The crate has two layers. [`lexer`] is a generic regex-dispatch engine
//! driven by declarative state tables; [`shadow`] is the table for the Shadow
//! language. Around them sit the [`registry`] of languages, input
//! [`options`], output [`format`]ters and the `shadowlex` command line.
//!
//! ```
//! use shadow_lexer::{shadow, TokenKind};
//!
//! let tokens: Vec<_> = shadow::table().tokenize("import foo.bar;").collect();
//! assert_eq!(tokens[0].kind, TokenKind::KeywordNamespace);
//! assert_eq!(tokens[2].text, "foo.bar");
//! ```

pub use crate::errors::{CliError, ConfigError};
pub use crate::lexer::{tokenize, LexTable, TokenStream};
pub use crate::token::{Span, Token, TokenKind};

pub mod cli;
pub mod errors;
pub mod format;
pub mod lexer;
pub mod options;
pub mod registry;
pub mod shadow;
pub mod style;
pub mod token;
