//! Grammar tables
//!
//! A [`GrammarDecl`] is the authoring form: named states holding ordered rules
//! and `include` directives, plus one parametrized fence family. The
//! [`compiler`] flattens it into an immutable [`Grammar`] whose states are
//! plain rule vectors addressed by [`StateId`].

pub mod compiler;
pub mod decl;
pub mod pattern;

pub use compiler::compile;
pub use decl::{Entry, FenceFamily, GrammarDecl, PatternDecl, RuleDecl, StateDecl};
pub use pattern::{MatchSpans, Pattern, RegexPattern, ScanFn, Scanner};

use crate::config::EngineConfig;
use crate::token::TokenKind;
use crate::tokenizer::Context;
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Compact handle for a compiled state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Computes a token kind from the matched text
pub type ComputeFn = fn(&str) -> TokenKind;

/// Classifies a match using information beyond the match itself
pub type Handler = fn(&MatchInput<'_>, &mut Context) -> Outcome;

/// How a rule turns a match into tokens
#[derive(Clone)]
pub enum RuleAction {
    /// One token kind for the whole match
    Static(TokenKind),
    /// One token kind per capture group
    Captures(Vec<TokenKind>),
    /// Kind derived from the matched text
    Computed(ComputeFn),
    /// Kind, transition and context effects decided by a handler
    ContextSensitive(Handler),
}

impl fmt::Debug for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Static(kind) => f.debug_tuple("Static").field(kind).finish(),
            RuleAction::Captures(kinds) => f.debug_tuple("Captures").field(kinds).finish(),
            RuleAction::Computed(_) => f.write_str("Computed"),
            RuleAction::ContextSensitive(_) => f.write_str("ContextSensitive"),
        }
    }
}

/// Everything a context-sensitive handler may inspect
pub struct MatchInput<'a> {
    /// Text covered by the match
    pub text: &'a str,
    /// The full line being scanned
    pub line: &'a str,
    /// Capture spans of the match
    pub spans: &'a MatchSpans,
    /// State in which the rule matched
    pub state: StateId,
    /// Transition declared on the rule, if any
    pub declared_next: Option<StateId>,
    /// The grammar, for state lookups
    pub grammar: &'a Grammar,
    /// Engine options in effect for this scan
    pub config: &'a EngineConfig,
}

/// Transition chosen by a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Use the rule's declared next state (or stay if it has none)
    Declared,
    /// Remain in the current state
    Stay,
    /// Move to the given state
    To(StateId),
}

/// Result of a context-sensitive handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Token kinds with their byte lengths, in order
    pub tokens: Vec<(TokenKind, usize)>,
    pub transition: Transition,
}

impl Outcome {
    /// A single token covering the whole match
    pub fn single(kind: TokenKind, len: usize) -> Self {
        Self {
            tokens: vec![(kind, len)],
            transition: Transition::Declared,
        }
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Pattern,
    pub action: RuleAction,
    pub next: Option<StateId>,
}

/// A compiled state
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    rules: Arc<[Rule]>,
    default_token: TokenKind,
    width: Option<usize>,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Kind used for characters no rule matches
    pub fn default_token(&self) -> TokenKind {
        self.default_token
    }

    /// Fence width carried by a parametrized state
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Whether two states run the same rule template
    pub fn shares_rules_with(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.rules, &other.rules)
    }
}

/// Immutable, flattened grammar shared by every open document
pub struct Grammar {
    states: Vec<State>,
    by_name: HashMap<String, StateId>,
    fence_widths: RangeInclusive<usize>,
    fence_states: Vec<StateId>,
    initial: StateId,
}

impl Grammar {
    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.state(id).map(State::name)
    }

    pub fn contains(&self, id: StateId) -> bool {
        id.0 < self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states.iter().enumerate().map(|(i, s)| (StateId(i), s))
    }

    /// Supported fence widths
    pub fn fence_widths(&self) -> RangeInclusive<usize> {
        self.fence_widths.clone()
    }

    /// The parametrized state handling fences of the given width
    pub fn fence_state(&self, width: usize) -> Option<StateId> {
        if !self.fence_widths.contains(&width) {
            return None;
        }
        self.fence_states
            .get(width - self.fence_widths.start())
            .copied()
    }

    /// Total number of compiled rules, counting shared templates once
    pub fn rule_count(&self) -> usize {
        let mut seen: Vec<*const Rule> = Vec::new();
        let mut total = 0;
        for state in &self.states {
            let ptr = state.rules.as_ptr();
            if !seen.contains(&ptr) {
                seen.push(ptr);
                total += state.rules.len();
            }
        }
        total
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("states", &self.states.len())
            .field("initial", &self.state_name(self.initial))
            .field("fence_widths", &self.fence_widths)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_grammar_is_shareable_across_threads() {
        assert_send_sync::<Grammar>();
        assert_send_sync::<Arc<Grammar>>();
        assert_send_sync::<Tokenizer>();
    }

    #[test]
    fn test_shared_grammar_scans_on_other_thread() {
        let tokenizer = Tokenizer::markdown(EngineConfig::default()).unwrap();
        let shared = tokenizer.clone();
        assert!(Arc::ptr_eq(tokenizer.grammar(), shared.grammar()));
        let handle = std::thread::spawn(move || {
            shared
                .scan_line("# Title", shared.initial_state(), &Context::default())
                .unwrap()
        });
        let there = handle.join().unwrap();
        let here = tokenizer
            .scan_line("# Title", tokenizer.initial_state(), &Context::default())
            .unwrap();
        assert_eq!(there, here);
    }
}
