//! Colour themes for the terminal formatter.
//!
//! A theme maps token kinds to styles. Lookups fall back through the kind
//! hierarchy, so a theme that styles only `Keyword` also colours
//! `Keyword.Type`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use termcolor::{Color, ColorSpec};

use crate::errors::CliError;
use crate::token::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Style {
    /// Colour name (`blue`), ANSI number (`33`) or RGB (`0,128,255`).
    pub fg: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Style {
    fn fg(color: &str) -> Self {
        Self {
            fg: Some(color.to_string()),
            ..Default::default()
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Unknown colour names are ignored rather than rejected.
    pub fn to_color_spec(&self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        spec.set_fg(self.fg.as_deref().and_then(|name| name.parse::<Color>().ok()))
            .set_bold(self.bold)
            .set_italic(self.italic)
            .set_underline(self.underline);
        spec
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme {
    styles: BTreeMap<TokenKind, Style>,
}

impl Theme {
    pub fn empty() -> Self {
        Self {
            styles: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, kind: TokenKind, style: Style) {
        self.styles.insert(kind, style);
    }

    /// Style for `kind` or its nearest styled ancestor.
    pub fn style_for(&self, kind: TokenKind) -> Option<&Style> {
        let mut current = Some(kind);
        while let Some(kind) = current {
            if let Some(style) = self.styles.get(&kind) {
                return Some(style);
            }
            current = kind.parent();
        }
        None
    }

    /// Load a theme from a JSON object keyed by dotted kind names.
    pub fn from_json_file(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Theme {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for Theme {
    fn default() -> Self {
        let mut theme = Theme::empty();
        theme.set(TokenKind::Comment, Style::fg("white").italic());
        theme.set(TokenKind::Keyword, Style::fg("magenta").bold());
        theme.set(TokenKind::KeywordType, Style::fg("cyan"));
        theme.set(TokenKind::KeywordConstant, Style::fg("yellow"));
        theme.set(TokenKind::NameFunction, Style::fg("blue").bold());
        theme.set(TokenKind::NameClass, Style::fg("yellow").bold());
        theme.set(TokenKind::NameNamespace, Style::fg("cyan").bold());
        theme.set(TokenKind::NameDecorator, Style::fg("magenta"));
        theme.set(TokenKind::String, Style::fg("green"));
        theme.set(TokenKind::Number, Style::fg("yellow"));
        theme.set(TokenKind::Operator, Style::fg("red"));
        theme.set(
            TokenKind::Error,
            Style {
                fg: Some("red".into()),
                underline: true,
                ..Default::default()
            },
        );
        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_fall_back_to_parent_kinds() {
        let theme = Theme::default();
        assert_eq!(
            theme.style_for(TokenKind::KeywordDeclaration),
            theme.style_for(TokenKind::Keyword)
        );
        assert_ne!(
            theme.style_for(TokenKind::KeywordType),
            theme.style_for(TokenKind::Keyword)
        );
        assert!(theme.style_for(TokenKind::Text).is_none());
        assert!(theme.style_for(TokenKind::Name).is_none());
    }

    #[test]
    fn parses_json_keyed_by_dotted_names() {
        let theme: Theme = serde_json::from_str(
            r#"{ "Name.Class": { "fg": "green", "bold": true }, "Number": { "fg": "33" } }"#,
        )
        .unwrap();
        let class = theme.style_for(TokenKind::NameClass).unwrap();
        assert!(class.bold);
        assert_eq!(class.to_color_spec().fg(), Some(&Color::Green));
        assert_eq!(
            theme.style_for(TokenKind::NumberHex).unwrap().to_color_spec().fg(),
            Some(&Color::Ansi256(33))
        );
    }

    #[test]
    fn rejects_unknown_kinds() {
        let result: Result<Theme, _> = serde_json::from_str(r#"{ "Name.Bogus": {} }"#);
        assert!(result.is_err());
    }
}
