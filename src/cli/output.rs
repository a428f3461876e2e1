//! Handles all user-facing output for the CLI.
//!
//! Picks the output stream for a format and colour mode and hands tokens to
//! the matching formatter in [`crate::format`].

use std::io::{self, BufWriter, StdoutLock, Write};

use termcolor::{ColorChoice, StandardStream};

use crate::cli::args::ColorMode;
use crate::format::{self, OutputFormat};
use crate::style::Theme;
use crate::token::Token;

impl ColorMode {
    /// Resolve `Auto` against whether stdout is a terminal.
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

/// Write a token stream to stdout in the requested format.
pub fn write_tokens<'s>(
    tokens: impl IntoIterator<Item = Token<'s>>,
    output: OutputFormat,
    color: ColorMode,
    theme: &Theme,
) -> io::Result<()> {
    match output {
        OutputFormat::Terminal => {
            let stream = StandardStream::stdout(color.choice());
            let mut locked = stream.lock();
            format::write_terminal(tokens, theme, &mut locked)?;
            locked.flush()
        }
        OutputFormat::Raw => buffered(|out| format::write_raw(tokens, out)),
        OutputFormat::Json => buffered(|out| format::write_json(tokens, out)),
        OutputFormat::Html => buffered(|out| format::write_html(tokens, out)),
    }
}

fn buffered(
    write: impl FnOnce(&mut BufWriter<StdoutLock<'static>>) -> io::Result<()>,
) -> io::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    write(&mut out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_color_modes_are_honoured() {
        assert_eq!(ColorMode::Always.choice(), ColorChoice::Always);
        assert_eq!(ColorMode::Never.choice(), ColorChoice::Never);
    }
}
