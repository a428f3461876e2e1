//! The `shadowlex` command-line interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::cli::args::{ColorMode, Command, GlobalArgs, ShadowArgs};
use crate::errors::CliError;
use crate::format::OutputFormat;
use crate::options::LexerOptions;
use crate::registry::{default_registry, shadow_language, Language, LanguageRegistry};
use crate::style::Theme;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> miette::Result<()> {
    let args = ShadowArgs::parse();
    init_tracing(args.global.verbose);

    match dispatch(args) {
        // The reader went away (e.g. `| head`); that is not a failure.
        Err(CliError::Write(e)) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result.map_err(Into::into),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Execute a parsed command line.
pub fn dispatch(args: ShadowArgs) -> Result<(), CliError> {
    let registry = default_registry();
    let options = parse_options(&args.global)?;

    match args.command {
        Command::Tokens { file, format } => {
            handle_tokens(registry, &args.global, options, &file, format)
        }
        Command::Highlight {
            paths,
            format,
            color,
            theme,
        } => {
            let theme = match theme {
                Some(path) => Theme::from_json_file(&path)?,
                None => Theme::default(),
            };
            let session = Session {
                registry,
                global: &args.global,
                options,
                format,
                color,
                theme,
            };
            handle_highlight(&session, &paths)
        }
        Command::Languages => handle_languages(registry),
        Command::Lint => handle_lint(registry),
    }
}

fn parse_options(global: &GlobalArgs) -> Result<LexerOptions, CliError> {
    let mut options = LexerOptions::default();
    for assignment in &global.options {
        options.set(assignment).map_err(CliError::InvalidOption)?;
    }
    Ok(options)
}

/// Pick a language: explicit `--lexer`, then file name, then content
/// sniffing, then Shadow.
fn select_language(
    registry: &LanguageRegistry,
    global: &GlobalArgs,
    path: Option<&Path>,
    text: &str,
) -> Result<Language, CliError> {
    if let Some(alias) = &global.lexer {
        return registry
            .by_alias(alias)
            .copied()
            .ok_or_else(|| CliError::UnknownLexer(alias.clone()));
    }
    let found = path
        .and_then(|path| registry.for_filename(path))
        .or_else(|| registry.guess(text))
        .copied()
        .unwrap_or_else(shadow_language);
    Ok(found)
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let result = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map(|_| text)
    } else {
        std::fs::read_to_string(path)
    };
    result.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn handle_tokens(
    registry: &LanguageRegistry,
    global: &GlobalArgs,
    options: LexerOptions,
    file: &Path,
    format: OutputFormat,
) -> Result<(), CliError> {
    let source = read_input(file)?;
    let named = (file != Path::new("-")).then_some(file);
    let language = select_language(registry, global, named, &source)?;
    debug!(language = language.name(), file = %file.display(), "tokenizing");

    let text = options.prepare(&source);
    let tokens = language.table().tokenize(&text);
    output::write_tokens(tokens, format, ColorMode::Auto, &Theme::default())?;
    Ok(())
}

struct Session<'a> {
    registry: &'a LanguageRegistry,
    global: &'a GlobalArgs,
    options: LexerOptions,
    format: OutputFormat,
    color: ColorMode,
    theme: Theme,
}

fn handle_highlight(session: &Session<'_>, paths: &[PathBuf]) -> Result<(), CliError> {
    let files = collect_files(session.registry, paths);
    info!(count = files.len(), "highlighting files");

    let show_headers = files.len() > 1;
    for file in &files {
        let source = read_input(file)?;
        let language = select_language(session.registry, session.global, Some(file), &source)?;
        if show_headers {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "==> {} <==", file.display())?;
        }
        let text = session.options.prepare(&source);
        let tokens = language.table().tokenize(&text);
        output::write_tokens(tokens, session.format, session.color, &session.theme)?;
    }
    Ok(())
}

/// Files are taken as given; directories contribute every file whose name
/// a registered language claims, in sorted order.
fn collect_files(registry: &LanguageRegistry, paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let walker = WalkDir::new(path).sort_by_file_name().into_iter();
        for entry in walker.filter_map(Result::ok) {
            if entry.file_type().is_file() && registry.for_filename(entry.path()).is_some() {
                files.push(entry.into_path());
            }
        }
    }
    files
}

fn handle_languages(registry: &LanguageRegistry) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    for language in registry.iter() {
        let info = language.info;
        writeln!(
            stdout,
            "{}\taliases: {}\tfiles: {}\tmimetypes: {}",
            info.name,
            info.aliases.join(", "),
            info.filenames.join(", "),
            info.mimetypes.join(", ")
        )?;
    }
    Ok(())
}

fn handle_lint(registry: &LanguageRegistry) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    let mut findings = 0;
    for language in registry.iter() {
        let grammar = (language.grammar)();
        grammar.compile()?;
        let lints = grammar.lint();
        findings += lints.len();
        for lint in &lints {
            writeln!(stdout, "{}: {}", language.name(), lint)?;
        }
        if lints.is_empty() {
            writeln!(stdout, "{}: ok", language.name())?;
        }
    }
    if findings > 0 {
        return Err(CliError::Lint(findings));
    }
    Ok(())
}
