//! Grammar declarations
//!
//! States are declared as ordered lists of [`Entry`] values. An entry is either
//! a rule or an `include` of another state's rules, spliced in at that point.
//! Nothing here is validated; the compiler does that.

use super::pattern::Scanner;
use super::{ComputeFn, Handler, RuleAction};
use crate::token::TokenKind;
use std::ops::RangeInclusive;

/// Source form of a pattern
#[derive(Debug, Clone)]
pub enum PatternDecl {
    Regex {
        source: String,
        followed_by: Option<String>,
        not_followed_by: Option<String>,
    },
    Scanner(Scanner),
}

/// A rule before compilation
#[derive(Debug, Clone)]
pub struct RuleDecl {
    pub pattern: PatternDecl,
    pub action: RuleAction,
    pub next: Option<String>,
}

impl RuleDecl {
    fn regex(source: &str, action: RuleAction) -> Self {
        Self {
            pattern: PatternDecl::Regex {
                source: source.to_string(),
                followed_by: None,
                not_followed_by: None,
            },
            action,
            next: None,
        }
    }

    /// Whole match gets one kind
    pub fn token(source: &str, kind: TokenKind) -> Self {
        Self::regex(source, RuleAction::Static(kind))
    }

    /// One kind per capture group
    pub fn captures(source: &str, kinds: &[TokenKind]) -> Self {
        Self::regex(source, RuleAction::Captures(kinds.to_vec()))
    }

    /// Kind computed from the matched text
    pub fn computed(source: &str, compute: ComputeFn) -> Self {
        Self::regex(source, RuleAction::Computed(compute))
    }

    /// Classification delegated to a context-sensitive handler
    pub fn handler(source: &str, handler: Handler) -> Self {
        Self::regex(source, RuleAction::ContextSensitive(handler))
    }

    /// Hand-written scanner with one kind per capture group
    pub fn scanner(scanner: Scanner, kinds: &[TokenKind]) -> Self {
        Self {
            pattern: PatternDecl::Scanner(scanner),
            action: RuleAction::Captures(kinds.to_vec()),
            next: None,
        }
    }

    /// Transition to `state` after a match
    pub fn next(mut self, state: &str) -> Self {
        self.next = Some(state.to_string());
        self
    }

    /// Require the text after the match to start with `source`
    pub fn followed_by(mut self, source: &str) -> Self {
        if let PatternDecl::Regex { followed_by, .. } = &mut self.pattern {
            *followed_by = Some(source.to_string());
        }
        self
    }

    /// Reject the match when the text after it starts with `source`
    pub fn not_followed_by(mut self, source: &str) -> Self {
        if let PatternDecl::Regex {
            not_followed_by, ..
        } = &mut self.pattern
        {
            *not_followed_by = Some(source.to_string());
        }
        self
    }

    /// Escape rules leave the current state; `no_escape` includes drop them
    pub fn is_escape(&self) -> bool {
        self.next.is_some()
    }
}

/// One item of a state's declaration
#[derive(Debug, Clone)]
pub enum Entry {
    Rule(RuleDecl),
    Include { state: String, no_escape: bool },
}

impl From<RuleDecl> for Entry {
    fn from(rule: RuleDecl) -> Self {
        Entry::Rule(rule)
    }
}

impl Entry {
    /// Splice in every rule of `state`
    pub fn include(state: &str) -> Self {
        Entry::Include {
            state: state.to_string(),
            no_escape: false,
        }
    }

    /// Splice in the rules of `state` that do not change state
    pub fn include_no_escape(state: &str) -> Self {
        Entry::Include {
            state: state.to_string(),
            no_escape: true,
        }
    }
}

/// A named state before compilation
#[derive(Debug, Clone)]
pub struct StateDecl {
    pub name: String,
    pub entries: Vec<Entry>,
    pub default_token: TokenKind,
}

impl StateDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
            default_token: TokenKind::Text,
        }
    }

    pub fn rule(mut self, rule: RuleDecl) -> Self {
        self.entries.push(Entry::Rule(rule));
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleDecl>) -> Self {
        self.entries.extend(rules.into_iter().map(Entry::Rule));
        self
    }

    pub fn include(mut self, state: &str) -> Self {
        self.entries.push(Entry::include(state));
        self
    }

    pub fn include_no_escape(mut self, state: &str) -> Self {
        self.entries.push(Entry::include_no_escape(state));
        self
    }

    /// Kind for characters no rule matches
    pub fn default_token(mut self, kind: TokenKind) -> Self {
        self.default_token = kind;
        self
    }
}

/// A family of states generated from one template, one per fence width
#[derive(Debug, Clone)]
pub struct FenceFamily {
    /// States are named `{prefix}-{width}`
    pub prefix: String,
    pub widths: RangeInclusive<usize>,
    pub entries: Vec<Entry>,
    pub default_token: TokenKind,
}

impl FenceFamily {
    pub fn state_name(&self, width: usize) -> String {
        format!("{}-{}", self.prefix, width)
    }
}

/// A complete grammar declaration
#[derive(Debug, Clone)]
pub struct GrammarDecl {
    pub initial: String,
    pub states: Vec<StateDecl>,
    pub fences: Option<FenceFamily>,
}

impl GrammarDecl {
    pub fn new(initial: &str) -> Self {
        Self {
            initial: initial.to_string(),
            states: Vec::new(),
            fences: None,
        }
    }

    pub fn state(mut self, state: StateDecl) -> Self {
        self.states.push(state);
        self
    }

    pub fn fences(mut self, family: FenceFamily) -> Self {
        self.fences = Some(family);
        self
    }
}
