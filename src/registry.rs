//! Language registry.
//!
//! Maps names, aliases, filename globs and MIME types to compiled lexer
//! tables. The default registry is built once and never mutated; it is an
//! outer layer over the engine, which knows nothing about it.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexer::{Grammar, LexTable};
use crate::shadow;

/// Static registration metadata for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Glob patterns such as `*.shadow`.
    pub filenames: &'static [&'static str],
    pub mimetypes: &'static [&'static str],
}

/// A registered language: metadata, its table and a content sniffer.
#[derive(Clone, Copy)]
pub struct Language {
    pub info: LanguageInfo,
    /// The uncompiled table, for linting.
    pub grammar: fn() -> Grammar,
    pub table: fn() -> &'static LexTable,
    /// Confidence in `0.0..=1.0` that a text is in this language.
    pub analyse: fn(&str) -> f32,
}

impl Language {
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn table(&self) -> &'static LexTable {
        (self.table)()
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language").field("info", &self.info).finish()
    }
}

#[derive(Debug, Default)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
    by_alias: HashMap<String, usize>,
    by_mimetype: HashMap<String, usize>,
    globs: Vec<(Regex, usize)>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a language. Later registrations win on conflicting keys,
    /// except for filename globs, which are tried in registration order.
    pub fn register(&mut self, language: Language) {
        let index = self.languages.len();
        self.by_alias
            .insert(language.info.name.to_ascii_lowercase(), index);
        for alias in language.info.aliases {
            self.by_alias.insert(alias.to_ascii_lowercase(), index);
        }
        for mimetype in language.info.mimetypes {
            self.by_mimetype.insert(mimetype.to_ascii_lowercase(), index);
        }
        for glob in language.info.filenames {
            if let Ok(regex) = glob_to_regex(glob) {
                self.globs.push((regex, index));
            }
        }
        self.languages.push(language);
    }

    /// Look up by display name or alias, case-insensitively.
    pub fn by_alias(&self, alias: &str) -> Option<&Language> {
        let index = self.by_alias.get(&alias.to_ascii_lowercase())?;
        self.languages.get(*index)
    }

    pub fn by_mimetype(&self, mimetype: &str) -> Option<&Language> {
        let index = self.by_mimetype.get(&mimetype.to_ascii_lowercase())?;
        self.languages.get(*index)
    }

    /// Match the file name (not the directory) against registered globs.
    pub fn for_filename(&self, path: &Path) -> Option<&Language> {
        let name = path.file_name()?.to_str()?;
        self.globs
            .iter()
            .find(|(regex, _)| regex.is_match(name))
            .and_then(|(_, index)| self.languages.get(*index))
    }

    /// The language whose sniffer is most confident, if any is at all.
    pub fn guess(&self, text: &str) -> Option<&Language> {
        self.languages
            .iter()
            .map(|language| ((language.analyse)(text), language))
            .filter(|(score, _)| *score > 0.0)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, language)| language)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.languages.iter()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Translate a filename glob (`*`, `?`, literal text) into an anchored regex.
fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

pub fn shadow_language() -> Language {
    Language {
        info: shadow::INFO,
        grammar: shadow::grammar,
        table: shadow::table,
        analyse: shadow::analyse_text,
    }
}

static DEFAULT: Lazy<LanguageRegistry> = Lazy::new(|| {
    let mut registry = LanguageRegistry::new();
    registry.register(shadow_language());
    registry
});

/// The process-wide registry of built-in languages.
pub fn default_registry() -> &'static LanguageRegistry {
    &DEFAULT
}
