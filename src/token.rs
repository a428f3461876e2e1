//! Token model for the Shadow lexer.
//!
//! A [`Token`] is a classified, borrowed slice of the input. Token kinds form a
//! shallow hierarchy (`Keyword.Type` is-a `Keyword`) so consumers such as the
//! terminal theme can fall back to a parent style when a kind has none.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// TOKEN KINDS
// ============================================================================

/// The fixed taxonomy of token kinds exposed to formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Text,
    Comment,
    CommentSingle,
    CommentMultiline,
    Keyword,
    KeywordDeclaration,
    KeywordType,
    KeywordNamespace,
    KeywordConstant,
    Name,
    NameFunction,
    NameClass,
    NameAttribute,
    NameNamespace,
    NameDecorator,
    String,
    StringChar,
    Number,
    NumberFloat,
    NumberHex,
    NumberBin,
    NumberOct,
    NumberInteger,
    Operator,
    Punctuation,
    Error,
}

impl TokenKind {
    /// Every kind, parents before children.
    pub const ALL: [TokenKind; 26] = [
        TokenKind::Text,
        TokenKind::Comment,
        TokenKind::CommentSingle,
        TokenKind::CommentMultiline,
        TokenKind::Keyword,
        TokenKind::KeywordDeclaration,
        TokenKind::KeywordType,
        TokenKind::KeywordNamespace,
        TokenKind::KeywordConstant,
        TokenKind::Name,
        TokenKind::NameFunction,
        TokenKind::NameClass,
        TokenKind::NameAttribute,
        TokenKind::NameNamespace,
        TokenKind::NameDecorator,
        TokenKind::String,
        TokenKind::StringChar,
        TokenKind::Number,
        TokenKind::NumberFloat,
        TokenKind::NumberHex,
        TokenKind::NumberBin,
        TokenKind::NumberOct,
        TokenKind::NumberInteger,
        TokenKind::Operator,
        TokenKind::Punctuation,
        TokenKind::Error,
    ];

    /// Dotted name, e.g. `Keyword.Type`.
    pub fn as_str(self) -> &'static str {
        use TokenKind::*;
        match self {
            Text => "Text",
            Comment => "Comment",
            CommentSingle => "Comment.Single",
            CommentMultiline => "Comment.Multiline",
            Keyword => "Keyword",
            KeywordDeclaration => "Keyword.Declaration",
            KeywordType => "Keyword.Type",
            KeywordNamespace => "Keyword.Namespace",
            KeywordConstant => "Keyword.Constant",
            Name => "Name",
            NameFunction => "Name.Function",
            NameClass => "Name.Class",
            NameAttribute => "Name.Attribute",
            NameNamespace => "Name.Namespace",
            NameDecorator => "Name.Decorator",
            String => "String",
            StringChar => "String.Char",
            Number => "Number",
            NumberFloat => "Number.Float",
            NumberHex => "Number.Hex",
            NumberBin => "Number.Bin",
            NumberOct => "Number.Oct",
            NumberInteger => "Number.Integer",
            Operator => "Operator",
            Punctuation => "Punctuation",
            Error => "Error",
        }
    }

    /// The immediate parent kind, or `None` for top-level kinds.
    pub fn parent(self) -> Option<TokenKind> {
        use TokenKind::*;
        match self {
            CommentSingle | CommentMultiline => Some(Comment),
            KeywordDeclaration | KeywordType | KeywordNamespace | KeywordConstant => Some(Keyword),
            NameFunction | NameClass | NameAttribute | NameNamespace | NameDecorator => Some(Name),
            StringChar => Some(String),
            NumberFloat | NumberHex | NumberBin | NumberOct | NumberInteger => Some(Number),
            Text | Comment | Keyword | Name | String | Number | Operator | Punctuation | Error => {
                None
            }
        }
    }

    /// True if `self` is `ancestor` or one of its descendants.
    pub fn is_a(self, ancestor: TokenKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Short CSS class used by the HTML formatter. `Text` has none.
    pub fn css_class(self) -> &'static str {
        use TokenKind::*;
        match self {
            Text => "",
            Comment => "c",
            CommentSingle => "c1",
            CommentMultiline => "cm",
            Keyword => "k",
            KeywordDeclaration => "kd",
            KeywordType => "kt",
            KeywordNamespace => "kn",
            KeywordConstant => "kc",
            Name => "n",
            NameFunction => "nf",
            NameClass => "nc",
            NameAttribute => "na",
            NameNamespace => "nn",
            NameDecorator => "nd",
            String => "s",
            StringChar => "sc",
            Number => "m",
            NumberFloat => "mf",
            NumberHex => "mh",
            NumberBin => "mb",
            NumberOct => "mo",
            NumberInteger => "mi",
            Operator => "o",
            Punctuation => "p",
            Error => "err",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a dotted kind name is not part of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token kind `{0}`")]
pub struct UnknownTokenKind(pub std::string::String);

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    /// Accepts the dotted name with or without a leading `Token.`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("Token.").unwrap_or(s);
        TokenKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| UnknownTokenKind(s.to_string()))
    }
}

impl Serialize for TokenKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TokenKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = std::string::String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SPANS AND TOKENS
// ============================================================================

/// Byte range into the lexed text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A classified span of source text. `text` borrows from the lexed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    /// Byte offset of `text` in the lexed input.
    pub start: usize,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, start: usize) -> Self {
        debug_assert!(!text.is_empty(), "tokens are never empty");
        Self { kind, text, start }
    }

    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end(),
        }
    }
}
