//! Grammar compilation
//!
//! Flattens includes, compiles patterns and resolves state names. Every
//! structural problem in a declaration is reported here so the scanner never
//! has to deal with a malformed table.

use super::decl::{Entry, FenceFamily, GrammarDecl, PatternDecl, RuleDecl, StateDecl};
use super::pattern::{Pattern, RegexPattern};
use super::{Grammar, Rule, RuleAction, State, StateId};
use crate::error::{GrammarError, GrammarResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Compile a declaration into an immutable grammar
pub fn compile(decl: &GrammarDecl) -> GrammarResult<Grammar> {
    let mut by_name: HashMap<String, StateId> = HashMap::new();
    let mut names: Vec<String> = decl.states.iter().map(|s| s.name.clone()).collect();
    if let Some(family) = &decl.fences {
        let (min, max) = (*family.widths.start(), *family.widths.end());
        if min == 0 || min > max {
            return Err(GrammarError::InvalidFenceRange { min, max });
        }
        names.extend(family.widths.clone().map(|w| family.state_name(w)));
    }
    for (index, name) in names.iter().enumerate() {
        if by_name.insert(name.clone(), StateId(index)).is_some() {
            return Err(GrammarError::DuplicateState {
                state: name.clone(),
            });
        }
    }

    let initial = by_name
        .get(&decl.initial)
        .copied()
        .ok_or_else(|| GrammarError::UnknownInitialState {
            state: decl.initial.clone(),
        })?;

    let decls: HashMap<&str, &StateDecl> =
        decl.states.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut states = Vec::with_capacity(names.len());
    for state in &decl.states {
        let flat = flatten(&state.name, &state.entries, &decls, &mut Vec::new())?;
        let rules = compile_rules(&state.name, &flat, &by_name)?;
        states.push(State {
            name: state.name.clone(),
            rules: rules.into(),
            default_token: state.default_token,
            width: None,
        });
    }

    let (fence_widths, fence_states) = match &decl.fences {
        Some(family) => {
            let template = compile_family(family, &decls, &by_name)?;
            let mut ids = Vec::new();
            for width in family.widths.clone() {
                let name = family.state_name(width);
                ids.push(by_name[&name]);
                states.push(State {
                    name,
                    rules: Arc::clone(&template),
                    default_token: family.default_token,
                    width: Some(width),
                });
            }
            (family.widths.clone(), ids)
        }
        None => (1..=0, Vec::new()),
    };

    let grammar = Grammar {
        states,
        by_name,
        fence_widths,
        fence_states,
        initial,
    };
    log::debug!(
        "Compiled grammar: {} states, {} rules, initial state {}",
        grammar.len(),
        grammar.rule_count(),
        decl.initial
    );
    Ok(grammar)
}

fn compile_family(
    family: &FenceFamily,
    decls: &HashMap<&str, &StateDecl>,
    by_name: &HashMap<String, StateId>,
) -> GrammarResult<Arc<[Rule]>> {
    let name = family.state_name(*family.widths.start());
    let flat = flatten(&name, &family.entries, decls, &mut Vec::new())?;
    let rules = compile_rules(&name, &flat, by_name)?;
    Ok(rules.into())
}

/// Expand includes in place, depth first
fn flatten(
    name: &str,
    entries: &[Entry],
    decls: &HashMap<&str, &StateDecl>,
    stack: &mut Vec<String>,
) -> GrammarResult<Vec<RuleDecl>> {
    if stack.iter().any(|s| s == name) {
        return Err(GrammarError::IncludeCycle {
            state: name.to_string(),
        });
    }
    stack.push(name.to_string());

    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Entry::Rule(rule) => out.push(rule.clone()),
            Entry::Include { state, no_escape } => {
                let target = decls.get(state.as_str()).ok_or_else(|| {
                    GrammarError::UnknownInclude {
                        state: name.to_string(),
                        target: state.clone(),
                    }
                })?;
                let included = flatten(&target.name, &target.entries, decls, stack)?;
                out.extend(
                    included
                        .into_iter()
                        .filter(|rule| !(*no_escape && rule.is_escape())),
                );
            }
        }
    }

    stack.pop();
    Ok(out)
}

fn compile_rules(
    state: &str,
    rules: &[RuleDecl],
    by_name: &HashMap<String, StateId>,
) -> GrammarResult<Vec<Rule>> {
    if rules.is_empty() {
        return Err(GrammarError::EmptyState {
            state: state.to_string(),
        });
    }
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| compile_rule(state, index, rule, by_name))
        .collect()
}

fn compile_rule(
    state: &str,
    index: usize,
    rule: &RuleDecl,
    by_name: &HashMap<String, StateId>,
) -> GrammarResult<Rule> {
    let pattern = match &rule.pattern {
        PatternDecl::Regex {
            source,
            followed_by,
            not_followed_by,
        } => RegexPattern::compile(source, followed_by.as_deref(), not_followed_by.as_deref())
            .map(Pattern::Regex)
            .map_err(|source_err| GrammarError::InvalidPattern {
                state: state.to_string(),
                pattern: source.clone(),
                source: source_err,
            })?,
        PatternDecl::Scanner(scanner) => Pattern::Scanner(*scanner),
    };

    if let RuleAction::Captures(kinds) = &rule.action {
        let groups = pattern.group_count();
        if kinds.len() != groups {
            return Err(GrammarError::CaptureMismatch {
                state: state.to_string(),
                index,
                tokens: kinds.len(),
                groups,
            });
        }
    }

    let next = match &rule.next {
        Some(target) => Some(by_name.get(target).copied().ok_or_else(|| {
            GrammarError::UnknownNextState {
                state: state.to_string(),
                index,
                target: target.clone(),
            }
        })?),
        None => None,
    };

    Ok(Rule {
        pattern,
        action: rule.action.clone(),
        next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Scanner;
    use crate::token::TokenKind;

    fn two_state_decl() -> GrammarDecl {
        GrammarDecl::new("start")
            .state(
                StateDecl::new("start")
                    .rule(RuleDecl::token("a", TokenKind::Keyword))
                    .include("shared")
                    .rule(RuleDecl::token("c", TokenKind::Constant)),
            )
            .state(
                StateDecl::new("shared")
                    .rule(RuleDecl::token("b", TokenKind::Strong))
                    .rule(RuleDecl::token("x", TokenKind::Comment).next("start")),
            )
    }

    fn describe(grammar: &Grammar, name: &str) -> Vec<String> {
        let id = grammar.state_id(name).unwrap();
        grammar
            .state(id)
            .unwrap()
            .rules()
            .iter()
            .map(|r| r.pattern.describe().to_string())
            .collect()
    }

    #[test]
    fn test_include_splices_in_place() {
        let grammar = compile(&two_state_decl()).unwrap();
        assert_eq!(describe(&grammar, "start"), vec!["a", "b", "x", "c"]);
        assert_eq!(grammar.initial_state(), grammar.state_id("start").unwrap());
    }

    #[test]
    fn test_no_escape_include_drops_transitions() {
        let decl = GrammarDecl::new("start")
            .state(StateDecl::new("start").include_no_escape("shared"))
            .state(
                StateDecl::new("shared")
                    .rule(RuleDecl::token("b", TokenKind::Strong))
                    .rule(RuleDecl::token("x", TokenKind::Comment).next("start")),
            );
        let grammar = compile(&decl).unwrap();
        assert_eq!(describe(&grammar, "start"), vec!["b"]);
    }

    #[test]
    fn test_nested_includes() {
        let decl = GrammarDecl::new("a")
            .state(StateDecl::new("a").include("b"))
            .state(StateDecl::new("b").include("c").rule(RuleDecl::token("2", TokenKind::Text)))
            .state(StateDecl::new("c").rule(RuleDecl::token("1", TokenKind::Text)));
        let grammar = compile(&decl).unwrap();
        assert_eq!(describe(&grammar, "a"), vec!["1", "2"]);
    }

    #[test]
    fn test_duplicate_state_rejected() {
        let decl = GrammarDecl::new("start")
            .state(StateDecl::new("start").rule(RuleDecl::token("a", TokenKind::Text)))
            .state(StateDecl::new("start").rule(RuleDecl::token("b", TokenKind::Text)));
        assert!(matches!(
            compile(&decl),
            Err(GrammarError::DuplicateState { .. })
        ));
    }

    #[test]
    fn test_unknown_next_state_rejected() {
        let decl = GrammarDecl::new("start").state(
            StateDecl::new("start").rule(RuleDecl::token("a", TokenKind::Text).next("nowhere")),
        );
        match compile(&decl) {
            Err(GrammarError::UnknownNextState { target, index, .. }) => {
                assert_eq!(target, "nowhere");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_include_rejected() {
        let decl =
            GrammarDecl::new("start").state(StateDecl::new("start").include("missing"));
        assert!(matches!(
            compile(&decl),
            Err(GrammarError::UnknownInclude { .. })
        ));
    }

    #[test]
    fn test_include_cycle_rejected() {
        let decl = GrammarDecl::new("a")
            .state(StateDecl::new("a").include("b"))
            .state(StateDecl::new("b").include("a"));
        assert!(matches!(
            compile(&decl),
            Err(GrammarError::IncludeCycle { .. })
        ));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let decl = GrammarDecl::new("start")
            .state(StateDecl::new("start").rule(RuleDecl::token("(", TokenKind::Text)));
        assert!(matches!(
            compile(&decl),
            Err(GrammarError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_capture_mismatch_rejected() {
        let decl = GrammarDecl::new("start").state(
            StateDecl::new("start").rule(RuleDecl::captures(
                "(a)(b)",
                &[TokenKind::Text, TokenKind::Keyword, TokenKind::Constant],
            )),
        );
        match compile(&decl) {
            Err(GrammarError::CaptureMismatch { tokens, groups, .. }) => {
                assert_eq!((tokens, groups), (3, 2));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_scanner_group_count_checked() {
        fn never(_: &str, _: usize) -> Option<crate::grammar::MatchSpans> {
            None
        }
        let scanner = Scanner {
            name: "never",
            groups: 2,
            scan: never,
        };
        let decl = GrammarDecl::new("start").state(
            StateDecl::new("start").rule(RuleDecl::scanner(scanner, &[TokenKind::Text])),
        );
        assert!(matches!(
            compile(&decl),
            Err(GrammarError::CaptureMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_state_rejected() {
        let decl = GrammarDecl::new("start").state(StateDecl::new("start"));
        assert!(matches!(compile(&decl), Err(GrammarError::EmptyState { .. })));
    }

    #[test]
    fn test_unknown_initial_state_rejected() {
        let decl = GrammarDecl::new("missing")
            .state(StateDecl::new("start").rule(RuleDecl::token("a", TokenKind::Text)));
        assert!(matches!(
            compile(&decl),
            Err(GrammarError::UnknownInitialState { .. })
        ));
    }

    #[test]
    fn test_fence_family_shares_one_template() {
        let family = FenceFamily {
            prefix: "block".to_string(),
            widths: 3..=5,
            entries: vec![
                RuleDecl::token("`+", TokenKind::Code).into(),
                Entry::include("shared"),
            ],
            default_token: TokenKind::Code,
        };
        let grammar = compile(&two_state_decl().fences(family)).unwrap();

        let three = grammar.state(grammar.fence_state(3).unwrap()).unwrap();
        let five = grammar.state(grammar.fence_state(5).unwrap()).unwrap();
        assert_eq!(three.name(), "block-3");
        assert_eq!(three.width(), Some(3));
        assert_eq!(five.width(), Some(5));
        assert!(three.shares_rules_with(five));
        assert_eq!(three.rules().len(), 3);
        assert!(grammar.fence_state(2).is_none());
        assert!(grammar.fence_state(6).is_none());
        assert_eq!(grammar.len(), 5);
        // start (4) + shared (2) + one fence template (3)
        assert_eq!(grammar.rule_count(), 9);
    }

    #[test]
    fn test_bad_fence_range_rejected() {
        let family = FenceFamily {
            prefix: "block".to_string(),
            widths: 0..=4,
            entries: vec![RuleDecl::token(".+", TokenKind::Code).into()],
            default_token: TokenKind::Code,
        };
        assert!(matches!(
            compile(&two_state_decl().fences(family)),
            Err(GrammarError::InvalidFenceRange { min: 0, max: 4 })
        ));
    }
}
