//! Token formatters.
//!
//! Every formatter consumes a token iterator and writes to any `io::Write`
//! (or `WriteColor` for the terminal). None of them buffer the whole stream.

use std::io::{self, Write};

use serde::Serialize;
use termcolor::WriteColor;

use crate::style::Theme;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One `Kind<TAB>"text"` line per token.
    #[default]
    Raw,
    /// JSON array of `{kind, text, start, end}` objects.
    Json,
    /// `<pre>` block with one `<span>` per token.
    Html,
    /// ANSI-coloured source.
    Terminal,
}

/// `Keyword.Type\t"int"` lines, text escaped like a Rust string literal.
pub fn write_raw<'s, W: Write>(
    tokens: impl IntoIterator<Item = Token<'s>>,
    out: &mut W,
) -> io::Result<()> {
    for token in tokens {
        writeln!(out, "{}\t{:?}", token.kind, token.text)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonToken<'s> {
    kind: TokenKind,
    text: &'s str,
    start: usize,
    end: usize,
}

pub fn write_json<'s, W: Write>(
    tokens: impl IntoIterator<Item = Token<'s>>,
    out: &mut W,
) -> io::Result<()> {
    out.write_all(b"[")?;
    for (index, token) in tokens.into_iter().enumerate() {
        if index > 0 {
            out.write_all(b",")?;
        }
        out.write_all(b"\n  ")?;
        let entry = JsonToken {
            kind: token.kind,
            text: token.text,
            start: token.start,
            end: token.end(),
        };
        serde_json::to_writer(&mut *out, &entry)?;
    }
    out.write_all(b"\n]\n")
}

pub fn write_html<'s, W: Write>(
    tokens: impl IntoIterator<Item = Token<'s>>,
    out: &mut W,
) -> io::Result<()> {
    out.write_all(b"<div class=\"highlight\"><pre>")?;
    for token in tokens {
        let class = token.kind.css_class();
        if class.is_empty() {
            out.write_all(escape_html(token.text).as_bytes())?;
        } else {
            write!(
                out,
                "<span class=\"{}\">{}</span>",
                class,
                escape_html(token.text)
            )?;
        }
    }
    out.write_all(b"</pre></div>\n")
}

pub fn write_terminal<'s, W: WriteColor>(
    tokens: impl IntoIterator<Item = Token<'s>>,
    theme: &Theme,
    out: &mut W,
) -> io::Result<()> {
    for token in tokens {
        match theme.style_for(token.kind) {
            Some(style) => {
                out.set_color(&style.to_color_spec())?;
                // Reset before newlines so colours never bleed into the next line.
                for (index, line) in token.text.split('\n').enumerate() {
                    if index > 0 {
                        out.reset()?;
                        out.write_all(b"\n")?;
                        out.set_color(&style.to_color_spec())?;
                    }
                    out.write_all(line.as_bytes())?;
                }
                out.reset()?;
            }
            None => out.write_all(token.text.as_bytes())?,
        }
    }
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
