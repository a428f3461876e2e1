//! Compiled, immutable lexer tables.
//!
//! [`Grammar::compile`] validates a grammar eagerly so that every
//! configuration mistake surfaces here, once, as a [`ConfigError`]:
//! undefined or cyclic state references, patterns that fail to compile or
//! can match the empty string, and group actions without a matching group.
//! A [`LexTable`] that exists is always safe to tokenize with.

use std::collections::HashMap;

use regex_automata::meta::{self, Regex};
use regex_automata::util::captures::Captures;
use regex_automata::{Anchored, Input};
use regex_syntax::hir::Hir;
use tracing::{debug, warn};

use crate::errors::ConfigError;
use crate::lexer::engine::TokenStream;
use crate::lexer::grammar::{Action, Entry, Flags, Grammar, GroupAction, RuleDef, Transition};

/// Index of a state inside a [`LexTable`].
pub type StateId = usize;

// ============================================================================
// COMPILED FORMS
// ============================================================================

#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) pattern: String,
    regex: Regex,
    pub(crate) action: Action<StateId>,
    pub(crate) transition: Option<Transition<StateId>>,
}

impl CompiledRule {
    /// End of an anchored match starting exactly at `at`, if any.
    pub(crate) fn match_at(&self, haystack: &str, at: usize) -> Option<usize> {
        let input = Input::new(haystack).range(at..).anchored(Anchored::Yes);
        self.regex
            .search(&input)
            .map(|m| m.end())
            .filter(|&end| end > at)
    }

    /// Anchored match at `at` with capture groups filled in, plus its end.
    pub(crate) fn captures_at(&self, haystack: &str, at: usize) -> Option<(usize, Captures)> {
        let input = Input::new(haystack).range(at..).anchored(Anchored::Yes);
        let mut caps = self.regex.create_captures();
        self.regex.search_captures(&input, &mut caps);
        let end = caps.get_match()?.end();
        (end > at).then_some((end, caps))
    }
}

#[derive(Debug)]
pub(crate) struct CompiledState {
    pub(crate) name: String,
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) fallback: Option<Transition<StateId>>,
}

/// A validated lexer table. Immutable and shareable across threads; each
/// call to [`LexTable::tokenize`] owns its own cursor and state stack.
#[derive(Debug)]
pub struct LexTable {
    name: String,
    initial: StateId,
    states: Vec<CompiledState>,
    ids: HashMap<String, StateId>,
}

impl LexTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.ids.get(name).copied()
    }

    pub fn state_name(&self, id: StateId) -> &str {
        &self.states[id].name
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of rules in `state` after include expansion.
    pub fn rule_count(&self, state: StateId) -> usize {
        self.states[state].rules.len()
    }

    /// Patterns of `state` in precedence order, after include expansion.
    pub fn patterns(&self, state: StateId) -> impl Iterator<Item = &str> {
        self.states[state].rules.iter().map(|rule| rule.pattern.as_str())
    }

    pub(crate) fn state(&self, id: StateId) -> &CompiledState {
        &self.states[id]
    }

    /// Lazily tokenize `text` from the initial state.
    pub fn tokenize<'t, 'src>(&'t self, text: &'src str) -> TokenStream<'t, 'src> {
        TokenStream::new(self, text, self.initial, 0)
    }

    /// Lazily tokenize `text` starting from the named state.
    pub fn tokenize_from<'t, 'src>(
        &'t self,
        state: &str,
        text: &'src str,
    ) -> Option<TokenStream<'t, 'src>> {
        let id = self.state_id(state)?;
        Some(TokenStream::new(self, text, id, 0))
    }
}

// ============================================================================
// COMPILATION
// ============================================================================

impl Grammar {
    /// Validate and compile this grammar. Lint findings are logged, not fatal.
    pub fn compile(&self) -> Result<LexTable, ConfigError> {
        let mut ids = HashMap::new();
        for (id, def) in self.states.iter().enumerate() {
            if ids.insert(def.name.clone(), id).is_some() {
                return Err(ConfigError::DuplicateState {
                    state: def.name.clone(),
                });
            }
        }
        let initial = *ids
            .get(&self.initial)
            .ok_or_else(|| ConfigError::MissingInitialState {
                grammar: self.name.clone(),
                state: self.initial.clone(),
            })?;

        let resolver = Resolver { ids: &ids };
        let mut states = Vec::with_capacity(self.states.len());
        for def in &self.states {
            let mut flattened = Vec::new();
            self.flatten_checked(&def.name, &mut Vec::new(), &mut flattened)?;

            let mut rules = Vec::with_capacity(flattened.len());
            for (index, rule) in flattened.into_iter().enumerate() {
                rules.push(compile_rule(&def.name, index, rule, self.flags, &resolver)?);
            }
            let fallback = def
                .fallback
                .as_ref()
                .map(|transition| resolver.transition(&def.name, None, transition))
                .transpose()?;
            states.push(CompiledState {
                name: def.name.clone(),
                rules,
                fallback,
            });
        }

        for lint in self.lint() {
            warn!(grammar = %self.name, "{lint}");
        }
        debug!(
            grammar = %self.name,
            states = states.len(),
            rules = states.iter().map(|s| s.rules.len()).sum::<usize>(),
            "compiled grammar"
        );

        Ok(LexTable {
            name: self.name.clone(),
            initial,
            states,
            ids,
        })
    }

    /// Like `flattened_rules`, but undefined and cyclic includes are errors.
    fn flatten_checked<'g>(
        &'g self,
        state: &str,
        path: &mut Vec<String>,
        out: &mut Vec<&'g RuleDef>,
    ) -> Result<(), ConfigError> {
        let def = self
            .get_state(state)
            .ok_or_else(|| ConfigError::UndefinedState {
                from: path.last().cloned().unwrap_or_default(),
                target: state.to_string(),
            })?;
        if path.iter().any(|seen| seen == state) {
            return Err(ConfigError::IncludeCycle {
                state: state.to_string(),
            });
        }
        path.push(state.to_string());
        for entry in &def.entries {
            match entry {
                Entry::Rule(rule) => out.push(rule),
                Entry::Include(name) => self.flatten_checked(name, path, out)?,
            }
        }
        path.pop();
        Ok(())
    }
}

struct Resolver<'a> {
    ids: &'a HashMap<String, StateId>,
}

impl Resolver<'_> {
    fn id(&self, from: &str, target: &str) -> Result<StateId, ConfigError> {
        self.ids
            .get(target)
            .copied()
            .ok_or_else(|| ConfigError::UndefinedState {
                from: from.to_string(),
                target: target.to_string(),
            })
    }

    fn transition(
        &self,
        from: &str,
        index: Option<usize>,
        transition: &Transition,
    ) -> Result<Transition<StateId>, ConfigError> {
        Ok(match transition {
            Transition::Push(targets) => Transition::Push(
                targets
                    .iter()
                    .map(|target| self.id(from, target))
                    .collect::<Result<_, _>>()?,
            ),
            Transition::PushCurrent => Transition::PushCurrent,
            Transition::Pop(0) => {
                return Err(ConfigError::ZeroPop {
                    state: from.to_string(),
                    index: index.unwrap_or_default(),
                })
            }
            Transition::Pop(n) => Transition::Pop(*n),
            Transition::Replace(target) => Transition::Replace(self.id(from, target)?),
        })
    }

    fn action(&self, from: &str, action: &Action) -> Result<Action<StateId>, ConfigError> {
        Ok(match action {
            Action::Token(kind) => Action::Token(*kind),
            Action::Groups { actions, gap } => Action::Groups {
                actions: actions
                    .iter()
                    .map(|group| -> Result<GroupAction<StateId>, ConfigError> {
                        Ok(match group {
                            GroupAction::Token(kind) => GroupAction::Token(*kind),
                            GroupAction::Using(target) => GroupAction::Using(self.id(from, target)?),
                            GroupAction::Skip => GroupAction::Skip,
                        })
                    })
                    .collect::<Result<_, ConfigError>>()?,
                gap: *gap,
            },
        })
    }
}

fn parse_pattern(
    state: &str,
    index: usize,
    pattern: &str,
    flags: Flags,
) -> Result<Hir, ConfigError> {
    regex_syntax::ParserBuilder::new()
        .multi_line(flags.multi_line)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .case_insensitive(flags.case_insensitive)
        .unicode(true)
        .build()
        .parse(pattern)
        .map_err(|e| ConfigError::invalid_pattern(state, index, pattern, e.to_string()))
}

fn compile_rule(
    state: &str,
    index: usize,
    rule: &RuleDef,
    flags: Flags,
    resolver: &Resolver<'_>,
) -> Result<CompiledRule, ConfigError> {
    let hir = parse_pattern(state, index, &rule.pattern, flags)?;
    let properties = hir.properties();
    if properties.minimum_len() == Some(0) {
        return Err(ConfigError::empty_match(state, index, &rule.pattern));
    }
    if let Action::Groups { actions, .. } = &rule.action {
        let groups = properties.explicit_captures_len();
        if actions.len() > groups {
            return Err(ConfigError::GroupCountMismatch {
                state: state.to_string(),
                index,
                actions: actions.len(),
                groups,
            });
        }
    }

    let regex = meta::Builder::new()
        .build_from_hir(&hir)
        .map_err(|e| ConfigError::invalid_pattern(state, index, &rule.pattern, e.to_string()))?;

    Ok(CompiledRule {
        pattern: rule.pattern.clone(),
        regex,
        action: resolver.action(state, &rule.action)?,
        transition: rule
            .transition
            .as_ref()
            .map(|transition| resolver.transition(state, Some(index), transition))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::grammar::include;
    use crate::token::TokenKind;

    fn name_rule() -> Entry {
        RuleDef::token(r"[a-z]+", TokenKind::Name).into()
    }

    #[test]
    fn missing_initial_state_is_rejected() {
        let err = Grammar::new("g")
            .initial("start")
            .state("root", vec![name_rule()])
            .compile()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingInitialState { .. }));
    }

    #[test]
    fn duplicate_state_is_rejected() {
        let err = Grammar::new("g")
            .state("root", vec![name_rule()])
            .state("root", vec![name_rule()])
            .compile()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateState { state } if state == "root"));
    }

    #[test]
    fn dangling_push_target_is_rejected() {
        let err = Grammar::new("g")
            .state(
                "root",
                vec![RuleDef::token("a", TokenKind::Name).push("nowhere").into()],
            )
            .compile()
            .unwrap_err();
        assert!(
            matches!(&err, ConfigError::UndefinedState { from, target } if from == "root" && target == "nowhere"),
            "{err}"
        );
    }

    #[test]
    fn dangling_using_target_is_rejected() {
        let err = Grammar::new("g")
            .state(
                "root",
                vec![RuleDef::groups("(a)", vec![GroupAction::Using("ghost".into())]).into()],
            )
            .compile()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedState { .. }));
    }

    #[test]
    fn dangling_fallback_target_is_rejected() {
        let err = Grammar::new("g")
            .state_with_fallback(
                "root",
                vec![name_rule()],
                Some(Transition::Replace("ghost".into())),
            )
            .compile()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedState { .. }));
    }

    #[test]
    fn include_cycles_and_unknown_includes_are_rejected() {
        let cyclic = Grammar::new("g")
            .state("root", vec![include("a")])
            .state("a", vec![name_rule(), include("root")])
            .compile()
            .unwrap_err();
        assert!(matches!(cyclic, ConfigError::IncludeCycle { .. }));

        let unknown = Grammar::new("g")
            .state("root", vec![include("missing")])
            .compile()
            .unwrap_err();
        assert!(matches!(unknown, ConfigError::UndefinedState { target, .. } if target == "missing"));
    }

    #[test]
    fn empty_matching_patterns_are_rejected() {
        for pattern in [r"a*", r"(?:)", r"\b", r"x?"] {
            let err = Grammar::new("g")
                .state("root", vec![RuleDef::token(pattern, TokenKind::Text).into()])
                .compile()
                .unwrap_err();
            assert!(matches!(err, ConfigError::EmptyMatch { .. }), "{pattern}");
        }
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let err = Grammar::new("g")
            .state("root", vec![RuleDef::token(r"(unclosed", TokenKind::Text).into()])
            .compile()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { index: 0, .. }));
    }

    #[test]
    fn group_actions_must_have_groups() {
        let err = Grammar::new("g")
            .state(
                "root",
                vec![RuleDef::groups(
                    r"(a)b",
                    vec![
                        GroupAction::Token(TokenKind::Name),
                        GroupAction::Token(TokenKind::Text),
                    ],
                )
                .into()],
            )
            .compile()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::GroupCountMismatch {
                actions: 2,
                groups: 1,
                ..
            }
        ));
    }

    #[test]
    fn zero_pop_is_rejected() {
        let err = Grammar::new("g")
            .state(
                "root",
                vec![RuleDef::token("a", TokenKind::Name)
                    .transition(Transition::Pop(0))
                    .into()],
            )
            .compile()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroPop { index: 0, .. }));
    }

    #[test]
    fn includes_are_flattened_at_compile_time() {
        let table = Grammar::new("g")
            .state("root", vec![include("common"), name_rule()])
            .state("common", vec![RuleDef::token(r"\s+", TokenKind::Text).into()])
            .compile()
            .unwrap();
        let root = table.state_id("root").unwrap();
        assert_eq!(table.rule_count(root), 2);
        assert_eq!(table.patterns(root).collect::<Vec<_>>(), [r"\s+", r"[a-z]+"]);
    }

    #[test]
    fn anchored_matching_does_not_search_ahead() {
        let table = Grammar::new("g")
            .state("root", vec![name_rule()])
            .compile()
            .unwrap();
        let rule = &table.state(table.initial_state()).rules[0];
        assert_eq!(rule.match_at("  ab", 0), None);
        assert_eq!(rule.match_at("  ab", 2), Some(4));
    }
}
