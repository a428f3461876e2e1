//! The regex-dispatch driver.
//!
//! Each step looks at the state on top of the stack, tries its rules in
//! order with an anchored match at the cursor, and applies the first one that
//! matches. When nothing matches, the state's fallback transition applies.
//! Fallbacks that pop always fire; any other fallback gets one chance per
//! position; after that a single character is emitted as
//! [`TokenKind::Error`]. Every step consumes input, shrinks the stack, or
//! spends the position's one growing fallback, so tokenization always
//! terminates and the tokens always concatenate back to the input.

use std::collections::VecDeque;

use regex_automata::util::captures::Captures;
use tracing::{trace, warn};

use crate::lexer::grammar::{Action, GroupAction, Transition};
use crate::lexer::table::{CompiledRule, LexTable, StateId};
use crate::token::{Token, TokenKind};

/// Nesting limit for `Using` group actions. Deeper groups are emitted whole
/// with the rule's gap kind.
pub const MAX_SUBLEX_DEPTH: usize = 32;

// ============================================================================
// LEXER CONTEXT
// ============================================================================

/// Cursor and state stack for one tokenization. The stack is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerContext {
    pos: usize,
    stack: Vec<StateId>,
    /// Position at which a non-popping fallback transition last fired.
    fallback_at: Option<usize>,
}

impl LexerContext {
    pub fn new(initial: StateId) -> Self {
        Self {
            pos: 0,
            stack: vec![initial],
            fallback_at: None,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bottom first, current state last.
    pub fn stack(&self) -> &[StateId] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> StateId {
        self.stack[self.stack.len() - 1]
    }

    pub fn apply(&mut self, transition: &Transition<StateId>) {
        match transition {
            Transition::Push(states) => self.stack.extend(states.iter().copied()),
            Transition::PushCurrent => self.stack.push(self.current()),
            Transition::Pop(n) => {
                let keep = self.stack.len().saturating_sub(*n).max(1);
                self.stack.truncate(keep);
            }
            Transition::Replace(state) => {
                let top = self.stack.len() - 1;
                self.stack[top] = *state;
            }
        }
    }
}

// ============================================================================
// TOKEN STREAM
// ============================================================================

/// Lazy, finite token iterator over one input.
///
/// Dropping the stream early is the way to stop tokenizing.
#[derive(Debug)]
pub struct TokenStream<'t, 'src> {
    table: &'t LexTable,
    text: &'src str,
    /// Offset of `text` inside the outermost input, for sub-lexed groups.
    base: usize,
    depth: usize,
    ctx: LexerContext,
    pending: VecDeque<Token<'src>>,
}

impl<'t, 'src> TokenStream<'t, 'src> {
    pub(crate) fn new(table: &'t LexTable, text: &'src str, initial: StateId, base: usize) -> Self {
        Self {
            table,
            text,
            base,
            depth: 0,
            ctx: LexerContext::new(initial),
            pending: VecDeque::new(),
        }
    }

    pub fn context(&self) -> &LexerContext {
        &self.ctx
    }

    /// Names of the states on the stack, bottom first.
    pub fn state_names(&self) -> Vec<&'t str> {
        let table = self.table;
        self.ctx.stack().iter().map(|&id| table.state_name(id)).collect()
    }

    fn step(&mut self) {
        let table = self.table;
        let pos = self.ctx.pos;
        let state = table.state(self.ctx.current());

        for rule in &state.rules {
            if let Some(end) = self.try_rule(rule, pos) {
                if let Some(transition) = &rule.transition {
                    self.ctx.apply(transition);
                }
                self.ctx.pos = end;
                return;
            }
        }

        if let Some(fallback) = &state.fallback {
            // Pops that shrink the stack always terminate; anything else may
            // fire only once per position.
            let shrinks = matches!(fallback, Transition::Pop(_)) && self.ctx.depth() > 1;
            if shrinks || self.ctx.fallback_at != Some(pos) {
                if !shrinks {
                    self.ctx.fallback_at = Some(pos);
                }
                self.ctx.apply(fallback);
                return;
            }
        }

        let width = self.text[pos..].chars().next().map_or(1, char::len_utf8);
        trace!(
            offset = self.base + pos,
            state = %state.name,
            "no rule matched; emitting error token"
        );
        self.emit(TokenKind::Error, pos, pos + width);
        self.ctx.pos = pos + width;
    }

    /// Emit the rule's tokens and return the match end, if the rule matches.
    fn try_rule(&mut self, rule: &CompiledRule, pos: usize) -> Option<usize> {
        match &rule.action {
            Action::Token(kind) => {
                let end = rule.match_at(self.text, pos)?;
                self.emit(*kind, pos, end);
                Some(end)
            }
            Action::Groups { actions, gap } => {
                let (end, caps) = rule.captures_at(self.text, pos)?;
                self.emit_groups(&caps, actions, *gap, pos, end);
                Some(end)
            }
        }
    }

    fn emit_groups(
        &mut self,
        caps: &Captures,
        actions: &[GroupAction<StateId>],
        gap: TokenKind,
        start: usize,
        end: usize,
    ) {
        let mut cursor = start;
        for (index, action) in actions.iter().enumerate() {
            if matches!(action, GroupAction::Skip) {
                continue;
            }
            let Some(span) = caps.get_group(index + 1) else {
                continue;
            };
            if span.is_empty() || span.start < cursor {
                continue;
            }
            self.emit(gap, cursor, span.start);
            match action {
                GroupAction::Token(kind) => self.emit(*kind, span.start, span.end),
                GroupAction::Using(state) => self.sub_lex(*state, span.start, span.end, gap),
                GroupAction::Skip => {}
            }
            cursor = span.end;
        }
        self.emit(gap, cursor, end);
    }

    fn sub_lex(&mut self, state: StateId, start: usize, end: usize, gap: TokenKind) {
        if self.depth >= MAX_SUBLEX_DEPTH {
            warn!(
                offset = self.base + start,
                "sub-lexing nested too deeply; emitting group as one token"
            );
            self.emit(gap, start, end);
            return;
        }
        let text = self.text;
        let mut nested = TokenStream::new(self.table, &text[start..end], state, self.base + start);
        nested.depth = self.depth + 1;
        self.pending.extend(nested);
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) {
        if start < end {
            let text = self.text;
            self.pending
                .push_back(Token::new(kind, &text[start..end], self.base + start));
        }
    }
}

impl<'t, 'src> Iterator for TokenStream<'t, 'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.ctx.pos >= self.text.len() {
                return None;
            }
            self.step();
        }
    }
}

impl std::iter::FusedIterator for TokenStream<'_, '_> {}

/// Tokenize `input` with `table` from its initial state.
pub fn tokenize<'t, 'src>(table: &'t LexTable, input: &'src str) -> TokenStream<'t, 'src> {
    table.tokenize(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::grammar::{Grammar, RuleDef};

    fn kinds_and_texts<'a>(table: &LexTable, input: &'a str) -> Vec<(TokenKind, &'a str)> {
        table.tokenize(input).map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn pop_never_empties_the_stack() {
        let mut ctx = LexerContext::new(0);
        ctx.apply(&Transition::Pop(1));
        assert_eq!(ctx.stack(), [0]);
        ctx.apply(&Transition::Push(vec![1, 2]));
        ctx.apply(&Transition::Pop(5));
        assert_eq!(ctx.stack(), [0]);
    }

    #[test]
    fn replace_and_push_current() {
        let mut ctx = LexerContext::new(0);
        ctx.apply(&Transition::Replace(3));
        assert_eq!(ctx.stack(), [3]);
        ctx.apply(&Transition::PushCurrent);
        ctx.apply(&Transition::Push(vec![1]));
        ctx.apply(&Transition::Replace(2));
        assert_eq!(ctx.stack(), [3, 3, 2]);
    }

    #[test]
    fn unmatched_characters_become_single_error_tokens() {
        let table = Grammar::new("g")
            .state("root", vec![RuleDef::token(r"[a-z]+", TokenKind::Name).into()])
            .compile()
            .unwrap();
        assert_eq!(
            kinds_and_texts(&table, "ab→c"),
            [
                (TokenKind::Name, "ab"),
                (TokenKind::Error, "→"),
                (TokenKind::Name, "c"),
            ]
        );
    }

    #[test]
    fn fallback_fires_once_per_position() {
        // `inner` falls back to itself, which would loop forever without the guard.
        let table = Grammar::new("g")
            .state("root", vec![RuleDef::token("<", TokenKind::Punctuation).push("inner").into()])
            .state_with_fallback(
                "inner",
                vec![RuleDef::token("[a-z]+", TokenKind::Name).into()],
                Some(Transition::PushCurrent),
            )
            .compile()
            .unwrap();
        let mut stream = table.tokenize("<ab!");
        let tokens: Vec<_> = stream.by_ref().map(|t| (t.kind, t.text)).collect();
        assert_eq!(
            tokens,
            [
                (TokenKind::Punctuation, "<"),
                (TokenKind::Name, "ab"),
                (TokenKind::Error, "!"),
            ]
        );
        assert_eq!(stream.state_names(), ["root", "inner", "inner"]);
    }

    #[test]
    fn fallback_pops_back_to_caller() {
        let table = Grammar::new("g")
            .state(
                "root",
                vec![
                    RuleDef::token("@", TokenKind::Punctuation).push("attr").into(),
                    RuleDef::token(r"\s+", TokenKind::Text).into(),
                    RuleDef::token("[a-z]+", TokenKind::Name).into(),
                ],
            )
            .state_with_fallback(
                "attr",
                vec![RuleDef::token("[a-z]+", TokenKind::NameDecorator).into()],
                Some(Transition::Pop(1)),
            )
            .compile()
            .unwrap();
        assert_eq!(
            kinds_and_texts(&table, "@inline fn"),
            [
                (TokenKind::Punctuation, "@"),
                (TokenKind::NameDecorator, "inline"),
                (TokenKind::Text, " "),
                (TokenKind::Name, "fn"),
            ]
        );
    }

    #[test]
    fn groups_emit_gaps_and_skip_empty_groups() {
        let table = Grammar::new("g")
            .state(
                "root",
                vec![RuleDef::groups(
                    r"(let)\s+(mut\s+)?([a-z]+)",
                    vec![
                        GroupAction::Token(TokenKind::Keyword),
                        GroupAction::Token(TokenKind::KeywordDeclaration),
                        GroupAction::Token(TokenKind::Name),
                    ],
                )
                .into()],
            )
            .compile()
            .unwrap();
        assert_eq!(
            kinds_and_texts(&table, "let x"),
            [
                (TokenKind::Keyword, "let"),
                (TokenKind::Text, " "),
                (TokenKind::Name, "x"),
            ]
        );
        assert_eq!(
            kinds_and_texts(&table, "let mut y"),
            [
                (TokenKind::Keyword, "let"),
                (TokenKind::Text, " "),
                (TokenKind::KeywordDeclaration, "mut "),
                (TokenKind::Name, "y"),
            ]
        );
    }

    #[test]
    fn skipped_groups_merge_into_the_gap() {
        let table = Grammar::new("g")
            .state(
                "root",
                vec![RuleDef::groups(
                    r"(\[)(\s*)([a-z]+)(\])",
                    vec![
                        GroupAction::Token(TokenKind::Punctuation),
                        GroupAction::Skip,
                        GroupAction::Token(TokenKind::Name),
                        GroupAction::Token(TokenKind::Punctuation),
                    ],
                )
                .into()],
            )
            .compile()
            .unwrap();
        assert_eq!(
            kinds_and_texts(&table, "[  a]"),
            [
                (TokenKind::Punctuation, "["),
                (TokenKind::Text, "  "),
                (TokenKind::Name, "a"),
                (TokenKind::Punctuation, "]"),
            ]
        );
    }

    #[test]
    fn using_groups_are_lexed_with_absolute_offsets() {
        let table = Grammar::new("g")
            .state(
                "root",
                vec![
                    RuleDef::groups(
                        r"(\{[^}]*\})",
                        vec![GroupAction::Using("inner".into())],
                    )
                    .into(),
                    RuleDef::token(r"\s+", TokenKind::Text).into(),
                ],
            )
            .state(
                "inner",
                vec![
                    RuleDef::token(r"[{}]", TokenKind::Punctuation).into(),
                    RuleDef::token(r"[0-9]+", TokenKind::NumberInteger).into(),
                ],
            )
            .compile()
            .unwrap();
        let tokens: Vec<_> = table.tokenize(" {42}").collect();
        let summary: Vec<_> = tokens.iter().map(|t| (t.kind, t.text, t.start)).collect();
        assert_eq!(
            summary,
            [
                (TokenKind::Text, " ", 0),
                (TokenKind::Punctuation, "{", 1),
                (TokenKind::NumberInteger, "42", 2),
                (TokenKind::Punctuation, "}", 4),
            ]
        );
    }

    #[test]
    fn self_recursive_using_is_bounded() {
        let table = Grammar::new("g")
            .state(
                "root",
                vec![RuleDef::groups(r"([a-z]+)", vec![GroupAction::Using("root".into())]).into()],
            )
            .compile()
            .unwrap();
        let tokens: Vec<_> = table.tokenize("abc").collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(tokens[0].kind, TokenKind::Text);
    }

    #[test]
    fn stream_is_lazy_and_resumable() {
        let table = Grammar::new("g")
            .state(
                "root",
                vec![
                    RuleDef::token(r"[a-z]+", TokenKind::Name).into(),
                    RuleDef::token(r" ", TokenKind::Text).into(),
                ],
            )
            .compile()
            .unwrap();
        let mut stream = table.tokenize("a b c");
        assert_eq!(stream.next().map(|t| t.text), Some("a"));
        assert_eq!(stream.context().position(), 1);
        assert_eq!(stream.count(), 4);
    }
}
