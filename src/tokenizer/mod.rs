//! Line tokenizer
//!
//! Scans one line at a time, starting from the state and context the previous
//! line ended with. The result carries the end state and context, so a host
//! can re-tokenize any line without touching the ones before it.

mod context;

pub use context::Context;

use crate::config::EngineConfig;
use crate::error::{ConfigResult, GrammarResult, ScanError, ScanResult};
use crate::grammar::{
    Grammar, MatchInput, MatchSpans, Rule, RuleAction, State, StateId, Transition,
};
use crate::token::{Token, TokenKind};
use std::ops::Range;
use std::sync::Arc;

/// Output of scanning a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine {
    pub tokens: Vec<Token>,
    pub end_state: StateId,
    pub end_context: Context,
}

impl TokenizedLine {
    /// Concatenated token text; equals the scanned line
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Token covering the given character column
    pub fn token_at(&self, column: usize) -> Option<&Token> {
        self.tokens.iter().find(|t| t.contains_column(column))
    }
}

/// Rule-driven tokenizer over a shared grammar
#[derive(Debug, Clone)]
pub struct Tokenizer {
    grammar: Arc<Grammar>,
    config: EngineConfig,
}

impl Tokenizer {
    pub fn new(grammar: Arc<Grammar>, config: EngineConfig) -> Self {
        Self { grammar, config }
    }

    /// Tokenizer for the R Markdown grammar
    pub fn markdown(config: EngineConfig) -> GrammarResult<Self> {
        let grammar = crate::markdown::grammar()?;
        Ok(Self::new(Arc::new(grammar), config))
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// State the first line of a document starts in
    pub fn initial_state(&self) -> StateId {
        self.grammar.initial_state()
    }

    pub fn rainbow_enabled(&self) -> bool {
        self.config.rainbow_enabled
    }

    /// Takes effect on the next scan; cached lines are left alone
    pub fn set_rainbow_enabled(&mut self, enabled: bool) {
        self.config.rainbow_enabled = enabled;
    }

    pub fn color_count(&self) -> usize {
        self.config.color_count
    }

    /// Change the color rotation modulus; zero is rejected
    pub fn set_color_count(&mut self, count: usize) -> ConfigResult<()> {
        let config = EngineConfig {
            color_count: count,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Scan a line starting in the named state
    pub fn scan_line_named(
        &self,
        line: &str,
        start: &str,
        context: &Context,
    ) -> ScanResult<TokenizedLine> {
        let id = self.grammar.state_id(start).ok_or_else(|| {
            log::warn!("Rejected unknown start state {:?}", start);
            ScanError::UnknownStateName {
                name: start.to_string(),
            }
        })?;
        self.scan_line(line, id, context)
    }

    /// Scan one line
    ///
    /// `line` must not contain the line terminator. The returned tokens cover
    /// the line exactly, in order.
    pub fn scan_line(
        &self,
        line: &str,
        start: StateId,
        context: &Context,
    ) -> ScanResult<TokenizedLine> {
        if !self.grammar.contains(start) {
            log::warn!("Rejected unknown start state id {}", start.index());
            return Err(ScanError::UnknownState { id: start.index() });
        }

        let mut state = start;
        let mut context = context.clone();
        let mut out = LineBuilder::new(line);
        let mut offset = 0;
        // States tried at the current offset; a state is never re-entered there
        let mut visited: Vec<StateId> = Vec::new();

        while offset < line.len() {
            let current = self.state(state)?;
            visited.push(state);

            let Some((rule, spans)) = find_match(current, line, offset) else {
                offset = out.push_char(current.default_token(), offset);
                visited.clear();
                continue;
            };

            let (pieces, next) = self.apply(rule, &spans, line, state, &mut context);
            if spans.is_empty() {
                state = next;
                if visited.contains(&state) {
                    let now = self.state(state)?;
                    offset = out.push_char(now.default_token(), offset);
                    visited.clear();
                }
                continue;
            }

            for (kind, range) in pieces {
                out.push(kind, range);
            }
            offset = spans.end;
            state = next;
            visited.clear();
        }

        // End-of-line pass: end-anchored rules may still move the state
        let current = self.state(state)?;
        if let Some((rule, spans)) = find_match(current, line, line.len()) {
            let (_, next) = self.apply(rule, &spans, line, state, &mut context);
            state = next;
        }

        let tokens = out.finish();
        log::trace!(
            "Scanned {:?}: {} tokens, {} -> {}",
            line,
            tokens.len(),
            self.grammar.state_name(start).unwrap_or("?"),
            self.grammar.state_name(state).unwrap_or("?")
        );
        Ok(TokenizedLine {
            tokens,
            end_state: state,
            end_context: context,
        })
    }

    /// Scan consecutive lines from the initial state and an empty context
    pub fn scan_lines<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> ScanResult<Vec<TokenizedLine>> {
        let mut state = self.initial_state();
        let mut context = Context::default();
        let mut result = Vec::new();
        for line in lines {
            let scanned = self.scan_line(line, state, &context)?;
            state = scanned.end_state;
            context = scanned.end_context.clone();
            result.push(scanned);
        }
        Ok(result)
    }

    fn state(&self, id: StateId) -> ScanResult<&State> {
        self.grammar
            .state(id)
            .ok_or(ScanError::UnknownState { id: id.index() })
    }

    /// Turn a match into token pieces and the state to continue in
    fn apply(
        &self,
        rule: &Rule,
        spans: &MatchSpans,
        line: &str,
        state: StateId,
        context: &mut Context,
    ) -> (Vec<(TokenKind, Range<usize>)>, StateId) {
        let declared = rule.next.unwrap_or(state);
        let whole = spans.start..spans.end;
        match &rule.action {
            RuleAction::Static(kind) => (vec![(*kind, whole)], declared),
            RuleAction::Computed(compute) => (vec![(compute(&line[whole.clone()]), whole)], declared),
            RuleAction::Captures(kinds) => {
                let fallback = kinds.first().copied().unwrap_or(TokenKind::Text);
                (split_captures(kinds, spans, fallback), declared)
            }
            RuleAction::ContextSensitive(handler) => {
                let input = MatchInput {
                    text: &line[whole],
                    line,
                    spans,
                    state,
                    declared_next: rule.next,
                    grammar: &self.grammar,
                    config: &self.config,
                };
                let outcome = handler(&input, context);
                let next = match outcome.transition {
                    Transition::Declared => declared,
                    Transition::Stay => state,
                    Transition::To(target) if self.grammar.contains(target) => target,
                    Transition::To(target) => {
                        log::warn!("Handler chose unknown state id {}", target.index());
                        state
                    }
                };
                (lay_out(&outcome.tokens, spans, line), next)
            }
        }
    }
}

/// First rule of `state` matching at `offset`
fn find_match<'g>(state: &'g State, line: &str, offset: usize) -> Option<(&'g Rule, MatchSpans)> {
    state
        .rules()
        .iter()
        .find_map(|rule| rule.pattern.match_at(line, offset).map(|m| (rule, m)))
}

/// Split a match along its capture groups
///
/// Text between groups belongs to the group before it; text before the first
/// group belongs to the first group. Groups that did not participate or
/// collapse to nothing produce no piece.
fn split_captures(
    kinds: &[TokenKind],
    spans: &MatchSpans,
    fallback: TokenKind,
) -> Vec<(TokenKind, Range<usize>)> {
    let mut pieces: Vec<(TokenKind, Range<usize>)> = Vec::new();
    let mut cursor = spans.start;

    for (kind, group) in kinds.iter().zip(&spans.groups) {
        let Some(group) = group else { continue };
        let start = group.start.max(cursor);
        let end = group.end.min(spans.end);
        if end <= start {
            continue;
        }
        let start = match pieces.last_mut() {
            Some(last) => {
                last.1.end = start;
                start
            }
            None => cursor,
        };
        pieces.push((*kind, start..end));
        cursor = end;
    }

    if cursor < spans.end {
        match pieces.last_mut() {
            Some(last) => last.1.end = spans.end,
            None => pieces.push((fallback, cursor..spans.end)),
        }
    }
    pieces
}

/// Place handler-provided token lengths over the match
fn lay_out(
    tokens: &[(TokenKind, usize)],
    spans: &MatchSpans,
    line: &str,
) -> Vec<(TokenKind, Range<usize>)> {
    let mut pieces: Vec<(TokenKind, Range<usize>)> = Vec::new();
    let mut cursor = spans.start;
    for &(kind, len) in tokens {
        let end = (cursor + len).min(spans.end);
        if end == cursor || !line.is_char_boundary(end) {
            continue;
        }
        pieces.push((kind, cursor..end));
        cursor = end;
    }
    if cursor < spans.end {
        match pieces.last_mut() {
            Some(last) => last.1.end = spans.end,
            None => pieces.push((TokenKind::Text, cursor..spans.end)),
        }
    }
    pieces
}

/// Accumulates tokens for one line, tracking character columns
struct LineBuilder<'a> {
    line: &'a str,
    tokens: Vec<Token>,
    column: usize,
}

impl<'a> LineBuilder<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            tokens: Vec::new(),
            column: 0,
        }
    }

    fn push(&mut self, kind: TokenKind, range: Range<usize>) {
        let text = &self.line[range];
        if text.is_empty() {
            return;
        }
        let width = text.chars().count();
        self.tokens.push(Token::new(kind, text, self.column));
        self.column += width;
    }

    /// Emit the character at `offset` as its own token; returns the new offset
    fn push_char(&mut self, kind: TokenKind, offset: usize) -> usize {
        let len = self.line[offset..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.push(kind, offset..offset + len);
        offset + len
    }

    fn finish(self) -> Vec<Token> {
        self.tokens
    }
}
