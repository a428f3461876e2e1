//! The Shadow language table.
//!
//! Four states: `root` does nearly all the work; `class`, `var` and `import`
//! are entered after a declaration keyword, consume one name and pop.
//!
//! Rule order in `root` is load-bearing. Reserved words come before the
//! method-signature rule so `throw new X()` is not read as a declaration of
//! `X`, and float forms come before the integer forms so `3.14` is one token.
//!
//! Whitespace classes also admit the ASCII separators `\x1C`..=`\x1F`.

use once_cell::sync::Lazy;

use crate::lexer::{words, Flags, Grammar, GroupAction, LexTable, RuleDef};
use crate::registry::LanguageInfo;
use crate::token::TokenKind::*;

pub const KEYWORDS: &[&str] = &[
    "and", "assert", "break", "case", "cast", "catch", "check", "continue", "copy", "create",
    "default", "destroy", "do", "else", "exception", "finally", "for", "foreach", "freeze", "if",
    "in", "is", "or", "recover", "return", "send", "skip", "spawn", "super", "switch", "this",
    "throw", "try", "while", "xor",
];

/// Declaration modifiers. `import` is lexed by its own namespace rule.
pub const MODIFIERS: &[&str] = &[
    "abstract", "constant", "extern", "get", "immutable", "locked", "native", "nullable",
    "private", "protected", "public", "readonly", "set",
];

/// Primitive type names. `var` is lexed by its own declaration rule.
pub const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "code", "double", "float", "int", "long", "short", "ubyte", "uint", "ulong",
    "ushort",
];

pub const CONSTANTS: &[&str] = &["false", "null", "true"];

const FLOAT: &str = concat!(
    r"([0-9][0-9_]*\.([0-9][0-9_]*)?|",
    r"\.[0-9][0-9_]*)",
    r"([eE][+\-]?[0-9][0-9_]*)?[fFdD]?|",
    r"[0-9][eE][+\-]?[0-9][0-9_]*[fFdD]?|",
    r"[0-9]([eE][+\-]?[0-9][0-9_]*)?[fFdD]|",
    r"0[xX]([0-9a-fA-F][0-9a-fA-F_]*\.?|",
    r"([0-9a-fA-F][0-9a-fA-F_]*)?\.[0-9a-fA-F][0-9a-fA-F_]*)",
    r"[pP][+\-]?[0-9][0-9_]*[fFdD]?",
);

const METHOD_SIGNATURE: &str = concat!(
    // return type: one or more identifier-like clusters, each followed by space
    r"((?:(?:[^\W\d]|\$)[\w.\[\]$<>]*[\s\x1C-\x1F]+)+?)",
    // method name
    r"((?:[^\W\d]|\$)[\w$]*)",
    r"([\s\x1C-\x1F]*)(\()",
);

/// Registration metadata consumed by the [`registry`](crate::registry).
pub const INFO: LanguageInfo = LanguageInfo {
    name: "Shadow",
    aliases: &["shadow"],
    filenames: &["*.shadow"],
    mimetypes: &["text/x-shadow", "text/plain"],
};

/// The Shadow table as data.
pub fn grammar() -> Grammar {
    Grammar::new("Shadow")
        .flags(Flags {
            multi_line: true,
            dot_matches_new_line: true,
            case_insensitive: false,
        })
        .state(
            "root",
            vec![
                RuleDef::token(r"[[\s\x1C-\x1F]--\n]+", Text).into(),
                RuleDef::token(r"//.*?(?:\n|\z)", CommentSingle).into(),
                RuleDef::token(r"/\*.*?\*/", CommentMultiline).into(),
                RuleDef::words(words(KEYWORDS, r"\b"), Keyword).into(),
                RuleDef::groups(
                    METHOD_SIGNATURE,
                    vec![
                        GroupAction::Using("root".into()),
                        GroupAction::Token(NameFunction),
                        GroupAction::Token(Text),
                        GroupAction::Token(Punctuation),
                    ],
                )
                .into(),
                RuleDef::token(r"\[[^\W\d][\w]*(,\s*[^\W\d][\w])*\]", NameDecorator).into(),
                RuleDef::words(words(MODIFIERS, r"\b"), KeywordDeclaration).into(),
                RuleDef::words(words(PRIMITIVES, r"\b"), KeywordType).into(),
                RuleDef::groups(
                    r"(package)([\s\x1C-\x1F]+)",
                    vec![GroupAction::Token(KeywordNamespace), GroupAction::Token(Text)],
                )
                .push("import")
                .into(),
                RuleDef::words(words(CONSTANTS, r"\b"), KeywordConstant).into(),
                RuleDef::groups(
                    r"(class|enum|interface|singleton)([\s\x1C-\x1F]+)",
                    vec![GroupAction::Token(KeywordDeclaration), GroupAction::Token(Text)],
                )
                .push("class")
                .into(),
                RuleDef::groups(
                    r"(var)([\s\x1C-\x1F]+)",
                    vec![GroupAction::Token(KeywordDeclaration), GroupAction::Token(Text)],
                )
                .push("var")
                .into(),
                RuleDef::groups(
                    r"(import)([\s\x1C-\x1F]+)",
                    vec![GroupAction::Token(KeywordNamespace), GroupAction::Token(Text)],
                )
                .push("import")
                .into(),
                RuleDef::token(r#""(\\\\|\\"|[^"])*""#, String).into(),
                RuleDef::token(r"'\\.'|'[^\\]'|'\\u[0-9a-fA-F]{4}'", StringChar).into(),
                RuleDef::groups(
                    r"(\.)((?:[^\W\d]|\$)[\w$]*)",
                    vec![GroupAction::Token(Punctuation), GroupAction::Token(NameAttribute)],
                )
                .into(),
                RuleDef::token(r"([^\W\d]|\$)[\w$]*", Name).into(),
                RuleDef::token(FLOAT, NumberFloat).into(),
                RuleDef::token(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*[lL]?[uU]?", NumberHex).into(),
                RuleDef::token(r"0[bB][01][01_]*[lL]?[uU]?", NumberBin).into(),
                RuleDef::token(r"0[cC][0-7_]+[lL]?[uU]?", NumberOct).into(),
                RuleDef::token(r"0|[1-9][0-9_]*[lL]?[uU]?", NumberInteger).into(),
                RuleDef::token(r"[~^*!%&\[\]<>|+=/?#-]", Operator).into(),
                RuleDef::token(r"[{}();:.,@]", Punctuation).into(),
                RuleDef::token(r"\n", Text).into(),
            ],
        )
        .state(
            "class",
            vec![RuleDef::token(r"(([^\W\d][\w:]*)@)?([^\W\d][\w]*)", NameClass)
                .pop()
                .into()],
        )
        .state(
            "var",
            vec![RuleDef::token(r"([^\W\d])[\w]*", Name).pop().into()],
        )
        .state(
            "import",
            vec![RuleDef::token(r"[\w:.]*[\w]+(@[\w]+)?", NameNamespace)
                .pop()
                .into()],
        )
}

static TABLE: Lazy<LexTable> = Lazy::new(|| {
    grammar()
        .compile()
        .expect("the built-in Shadow grammar is valid")
});

/// The compiled Shadow table, built on first use and shared read-only.
pub fn table() -> &'static LexTable {
    &TABLE
}

/// Content sniffing: a `#!` line mentioning `shadow` is a certain match.
pub fn analyse_text(text: &str) -> f32 {
    let Some(first_line) = text.lines().next() else {
        return 0.0;
    };
    let Some(interpreter) = first_line.strip_prefix("#!") else {
        return 0.0;
    };
    let names_shadow = interpreter
        .split(|c: char| c.is_whitespace() || c == '/')
        .any(|part| part == "shadow" || part.starts_with("shadow."));
    if names_shadow {
        1.0
    } else {
        0.0
    }
}
