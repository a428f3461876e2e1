//! Defines the command-line arguments and subcommands for `shadowlex`.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::format::OutputFormat;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "shadowlex",
    version,
    about = "Tokenize and highlight Shadow source code."
)]
pub struct ShadowArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Lexer to use, by name or alias. Guessed from the file name otherwise.
    #[arg(short, long, global = true)]
    pub lexer: Option<String>,

    /// Lexer option as key=value (strip_nl, strip_all, ensure_nl, tab_size,
    /// normalize_newlines). Repeatable.
    #[arg(short = 'O', long = "option", global = true, value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the token stream of a file, or of stdin when the file is `-`.
    Tokens {
        #[arg(default_value = "-")]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Raw)]
        format: OutputFormat,
    },
    /// Highlight files; directories are searched for registered file names.
    Highlight {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
        format: OutputFormat,

        #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
        color: ColorMode,

        /// JSON theme file keyed by dotted token kind names.
        #[arg(long)]
        theme: Option<PathBuf>,
    },
    /// List the registered languages.
    Languages,
    /// Check the built-in grammars for unreachable rules and states.
    Lint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}
