//! Declarative lexer tables.
//!
//! A [`Grammar`] is pure data: named states, each an ordered list of rules.
//! Declaration order is precedence, so reserved words must be listed before the
//! generic identifier rule. No pattern is compiled here; see
//! [`Grammar::compile`] for that.
//!
//! ```
//! use shadow_lexer::lexer::{Grammar, RuleDef};
//! use shadow_lexer::TokenKind;
//!
//! let grammar = Grammar::new("tiny").state(
//!     "root",
//!     vec![
//!         RuleDef::token(r"[a-z]+", TokenKind::Name).into(),
//!         RuleDef::token(r"\s+", TokenKind::Text).into(),
//!     ],
//! );
//! let table = grammar.compile().unwrap();
//! assert_eq!(table.tokenize("ab cd").count(), 3);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::token::TokenKind;

// ============================================================================
// FLAGS
// ============================================================================

/// Regex flags applied to every pattern of a grammar. Unicode is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    /// `^` and `$` match at line boundaries.
    pub multi_line: bool,
    /// `.` also matches `\n`.
    pub dot_matches_new_line: bool,
    pub case_insensitive: bool,
}

// ============================================================================
// ACTIONS AND TRANSITIONS
// ============================================================================

/// A change to the state stack. `S` is a state name while the grammar is
/// data and a resolved state id once compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<S = String> {
    /// Push each state in order; the last one ends up on top.
    Push(Vec<S>),
    /// Push another copy of the current state.
    PushCurrent,
    /// Pop `n` states, never removing the bottom one.
    Pop(usize),
    /// Pop the current state, then push the given one.
    Replace(S),
}

/// What to do with one capture group of a grouped rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupAction<S = String> {
    Token(TokenKind),
    /// Lex the group's text on its own, starting from the named state.
    Using(S),
    /// Emit the group's text with the rule's gap kind.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<S = String> {
    /// The whole match becomes one token.
    Token(TokenKind),
    /// Capture group `i + 1` is handled by action `i`. Text not covered by a
    /// handled group is emitted with `gap`.
    Groups {
        actions: Vec<GroupAction<S>>,
        gap: TokenKind,
    },
}

// ============================================================================
// RULES AND STATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDef {
    pub pattern: String,
    pub action: Action,
    pub transition: Option<Transition>,
    /// Literal words when built with [`words`], kept for the shadowing lint.
    pub words: Option<Words>,
}

impl RuleDef {
    pub fn new(pattern: impl Into<String>, action: Action) -> Self {
        Self {
            pattern: pattern.into(),
            action,
            transition: None,
            words: None,
        }
    }

    /// Single-kind rule.
    pub fn token(pattern: impl Into<String>, kind: TokenKind) -> Self {
        Self::new(pattern, Action::Token(kind))
    }

    /// Single-kind rule over a [`words`] alternation.
    pub fn words(words: Words, kind: TokenKind) -> Self {
        let mut rule = Self::token(words.pattern(), kind);
        rule.words = Some(words);
        rule
    }

    /// Grouped rule; uncovered text is emitted as [`TokenKind::Text`].
    pub fn groups(pattern: impl Into<String>, actions: Vec<GroupAction>) -> Self {
        Self::new(
            pattern,
            Action::Groups {
                actions,
                gap: TokenKind::Text,
            },
        )
    }

    pub fn push(self, state: impl Into<String>) -> Self {
        self.transition(Transition::Push(vec![state.into()]))
    }

    pub fn pop(self) -> Self {
        self.transition(Transition::Pop(1))
    }

    pub fn replace(self, state: impl Into<String>) -> Self {
        self.transition(Transition::Replace(state.into()))
    }

    pub fn transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }
}

/// A rule, or a splice of another state's rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Rule(RuleDef),
    Include(String),
}

impl From<RuleDef> for Entry {
    fn from(rule: RuleDef) -> Self {
        Entry::Rule(rule)
    }
}

/// Splice the rules of `state` in place when the grammar is compiled.
pub fn include(state: impl Into<String>) -> Entry {
    Entry::Include(state.into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDef {
    pub name: String,
    pub entries: Vec<Entry>,
    /// Applied when no rule matches, without consuming input.
    pub fallback: Option<Transition>,
}

/// A set of literal words followed by a common suffix, usually `\b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Words {
    pub words: Vec<String>,
    pub suffix: String,
}

impl Words {
    /// Escaped alternation in declaration order.
    pub fn pattern(&self) -> String {
        let alternation = self
            .words
            .iter()
            .map(|word| regex::escape(word))
            .collect::<Vec<_>>()
            .join("|");
        format!("(?:{alternation}){}", self.suffix)
    }
}

/// Build a [`Words`] set.
pub fn words(list: &[&str], suffix: &str) -> Words {
    Words {
        words: list.iter().map(|word| word.to_string()).collect(),
        suffix: suffix.to_string(),
    }
}

// ============================================================================
// GRAMMAR
// ============================================================================

/// A named, ordered collection of states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub name: String,
    pub initial: String,
    pub flags: Flags,
    pub states: Vec<StateDef>,
}

impl Grammar {
    /// New grammar whose initial state is `root`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: "root".to_string(),
            flags: Flags::default(),
            states: Vec::new(),
        }
    }

    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = state.into();
        self
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn state(self, name: impl Into<String>, entries: Vec<Entry>) -> Self {
        self.state_with_fallback(name, entries, None)
    }

    pub fn state_with_fallback(
        mut self,
        name: impl Into<String>,
        entries: Vec<Entry>,
        fallback: Option<Transition>,
    ) -> Self {
        self.states.push(StateDef {
            name: name.into(),
            entries,
            fallback,
        });
        self
    }

    pub fn get_state(&self, name: &str) -> Option<&StateDef> {
        self.states.iter().find(|state| state.name == name)
    }

    /// Rules of `state` with includes expanded, in precedence order.
    /// Unknown or cyclic includes are skipped here; `compile` rejects them.
    pub fn flattened_rules(&self, state: &str) -> Vec<&RuleDef> {
        let mut out = Vec::new();
        let mut visiting = HashSet::new();
        self.flatten_into(state, &mut visiting, &mut out);
        out
    }

    fn flatten_into<'g>(
        &'g self,
        state: &str,
        visiting: &mut HashSet<String>,
        out: &mut Vec<&'g RuleDef>,
    ) {
        let Some(def) = self.get_state(state) else {
            return;
        };
        if !visiting.insert(state.to_string()) {
            return;
        }
        for entry in &def.entries {
            match entry {
                Entry::Rule(rule) => out.push(rule),
                Entry::Include(name) => self.flatten_into(name, visiting, out),
            }
        }
        visiting.remove(state);
    }

    /// Report rules and states that can never take effect. Findings are
    /// advisory; a grammar with lints still compiles.
    pub fn lint(&self) -> Vec<Lint> {
        let mut lints = Vec::new();
        for def in &self.states {
            let rules = self.flattened_rules(&def.name);
            lint_duplicates(&def.name, &rules, &mut lints);
            lint_shadowed_words(&def.name, &rules, &mut lints);
        }
        let reachable = self.reachable_states();
        for def in &self.states {
            if !reachable.contains(def.name.as_str()) {
                lints.push(Lint {
                    state: def.name.clone(),
                    rule: None,
                    kind: LintKind::UnreachableState,
                });
            }
        }
        lints
    }

    fn reachable_states(&self) -> HashSet<&str> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.initial.as_str()]);
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            let Some(def) = self.get_state(name) else {
                continue;
            };
            let mut targets = Vec::new();
            for entry in &def.entries {
                match entry {
                    Entry::Include(target) => targets.push(target.as_str()),
                    Entry::Rule(rule) => {
                        if let Some(transition) = &rule.transition {
                            targets.extend(transition_targets(transition));
                        }
                        if let Action::Groups { actions, .. } = &rule.action {
                            targets.extend(actions.iter().filter_map(|action| match action {
                                GroupAction::Using(target) => Some(target.as_str()),
                                _ => None,
                            }));
                        }
                    }
                }
            }
            if let Some(fallback) = &def.fallback {
                targets.extend(transition_targets(fallback));
            }
            queue.extend(targets);
        }
        seen
    }
}

pub(crate) fn transition_targets(transition: &Transition) -> Vec<&str> {
    match transition {
        Transition::Push(states) => states.iter().map(String::as_str).collect(),
        Transition::Replace(state) => vec![state.as_str()],
        Transition::PushCurrent | Transition::Pop(_) => Vec::new(),
    }
}

fn lint_duplicates(state: &str, rules: &[&RuleDef], lints: &mut Vec<Lint>) {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (index, rule) in rules.iter().enumerate() {
        if let Some(&earlier) = first_seen.get(rule.pattern.as_str()) {
            lints.push(Lint {
                state: state.to_string(),
                rule: Some(index),
                kind: LintKind::DuplicatePattern { earlier },
            });
        } else {
            first_seen.insert(rule.pattern.as_str(), index);
        }
    }
}

fn lint_shadowed_words(state: &str, rules: &[&RuleDef], lints: &mut Vec<Lint>) {
    let mut claimed: HashMap<(&str, &str), usize> = HashMap::new();
    for (index, rule) in rules.iter().enumerate() {
        let Some(words) = &rule.words else {
            continue;
        };
        for word in &words.words {
            let key = (word.as_str(), words.suffix.as_str());
            match claimed.get(&key) {
                Some(&earlier) => lints.push(Lint {
                    state: state.to_string(),
                    rule: Some(index),
                    kind: LintKind::ShadowedWord {
                        word: word.clone(),
                        earlier,
                    },
                }),
                None => {
                    claimed.insert(key, index);
                }
            }
        }
    }
}

// ============================================================================
// LINT FINDINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lint {
    pub state: String,
    /// Index into the flattened rule list, if the finding is about a rule.
    pub rule: Option<usize>,
    pub kind: LintKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintKind {
    UnreachableState,
    DuplicatePattern { earlier: usize },
    ShadowedWord { word: String, earlier: usize },
}

impl fmt::Display for Lint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, self.rule) {
            (LintKind::UnreachableState, _) => {
                write!(f, "state `{}` is unreachable from the initial state", self.state)
            }
            (LintKind::DuplicatePattern { earlier }, Some(rule)) => write!(
                f,
                "{}[{}]: pattern duplicates rule {} and never matches",
                self.state, rule, earlier
            ),
            (LintKind::ShadowedWord { word, earlier }, Some(rule)) => write!(
                f,
                "{}[{}]: word `{}` is already claimed by rule {}",
                self.state, rule, word, earlier
            ),
            (kind, None) => write!(f, "{}: {:?}", self.state, kind),
        }
    }
}
