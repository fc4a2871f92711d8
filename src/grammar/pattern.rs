//! Anchored patterns
//!
//! A pattern either matches exactly at the scan offset or not at all. Regex
//! patterns are compiled as `\A(?:...)` and run against the rest of the line;
//! a leading `^` restricts them to column 0. Trailing lookaround, which the
//! `regex` crate does not support, is written as a `followed_by` or
//! `not_followed_by` guard checked at the match end (the guard does not
//! backtrack into the main pattern). Constructs that need back-references are
//! hand-written [`Scanner`]s.

use regex::Regex;
use std::fmt;
use std::ops::Range;

/// Spans produced by a successful match, in absolute byte offsets of the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpans {
    /// Start of the whole match (always the scan offset)
    pub start: usize,
    /// End of the whole match
    pub end: usize,
    /// One entry per capture group; `None` for groups that did not participate
    pub groups: Vec<Option<Range<usize>>>,
}

impl MatchSpans {
    pub fn new(start: usize, end: usize, groups: Vec<Option<Range<usize>>>) -> Self {
        Self { start, end, groups }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Signature of a hand-written matcher: `(line, offset)` to spans
pub type ScanFn = fn(&str, usize) -> Option<MatchSpans>;

/// A hand-written matcher with a fixed number of capture groups
#[derive(Clone, Copy)]
pub struct Scanner {
    /// Name used in diagnostics
    pub name: &'static str,
    /// Number of capture groups every match reports
    pub groups: usize,
    /// The matcher itself
    pub scan: ScanFn,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("name", &self.name)
            .field("groups", &self.groups)
            .finish()
    }
}

/// A compiled regex pattern with optional trailing guards
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    regex: Regex,
    line_start: bool,
    followed_by: Option<Regex>,
    not_followed_by: Option<Regex>,
}

impl RegexPattern {
    pub fn compile(
        source: &str,
        followed_by: Option<&str>,
        not_followed_by: Option<&str>,
    ) -> Result<Self, regex::Error> {
        let (line_start, body) = match source.strip_prefix('^') {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        Ok(Self {
            source: source.to_string(),
            regex: anchored(body)?,
            line_start,
            followed_by: followed_by.map(anchored).transpose()?,
            not_followed_by: not_followed_by.map(anchored).transpose()?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    pub fn match_at(&self, line: &str, offset: usize) -> Option<MatchSpans> {
        if self.line_start && offset != 0 {
            return None;
        }
        let caps = self.regex.captures(&line[offset..])?;
        let end = offset + caps.get(0)?.end();

        let rest = &line[end..];
        if let Some(guard) = &self.followed_by {
            if !guard.is_match(rest) {
                return None;
            }
        }
        if let Some(guard) = &self.not_followed_by {
            if guard.is_match(rest) {
                return None;
            }
        }

        let groups = (1..caps.len())
            .map(|i| caps.get(i).map(|m| offset + m.start()..offset + m.end()))
            .collect();
        Some(MatchSpans::new(offset, end, groups))
    }
}

fn anchored(body: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{})", body))
}

/// A pattern usable by a rule
#[derive(Debug, Clone)]
pub enum Pattern {
    Regex(RegexPattern),
    Scanner(Scanner),
}

impl Pattern {
    /// Match anchored at `offset`
    pub fn match_at(&self, line: &str, offset: usize) -> Option<MatchSpans> {
        match self {
            Pattern::Regex(pattern) => pattern.match_at(line, offset),
            Pattern::Scanner(scanner) => {
                let spans = (scanner.scan)(line, offset)?;
                debug_assert_eq!(spans.start, offset, "scanner {} moved start", scanner.name);
                Some(spans)
            }
        }
    }

    pub fn group_count(&self) -> usize {
        match self {
            Pattern::Regex(pattern) => pattern.group_count(),
            Pattern::Scanner(scanner) => scanner.groups,
        }
    }

    pub fn describe(&self) -> &str {
        match self {
            Pattern::Regex(pattern) => pattern.source(),
            Pattern::Scanner(scanner) => scanner.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(source: &str) -> RegexPattern {
        RegexPattern::compile(source, None, None).unwrap()
    }

    #[test]
    fn test_match_is_anchored_at_offset() {
        let p = pattern("[a-z]+");
        assert_eq!(p.match_at("12abc", 0), None);
        let m = p.match_at("12abc", 2).unwrap();
        assert_eq!((m.start, m.end), (2, 5));
    }

    #[test]
    fn test_caret_means_line_start() {
        let p = pattern(r"^#{1,6}");
        assert!(p.match_at("## x", 0).is_some());
        assert!(p.match_at("a ## x", 2).is_none());
    }

    #[test]
    fn test_dollar_means_line_end() {
        let p = pattern("$");
        assert!(p.match_at("abc", 1).is_none());
        let m = p.match_at("abc", 3).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn test_group_spans_are_absolute() {
        let p = pattern(r"(\$)([^$]*)(\$)");
        let m = p.match_at("x $a+b$ y", 2).unwrap();
        assert_eq!(p.group_count(), 3);
        assert_eq!(m.groups, vec![Some(2..3), Some(3..6), Some(6..7)]);
    }

    #[test]
    fn test_optional_group_reports_none() {
        let p = pattern(r"(a)(b)?");
        let m = p.match_at("ac", 0).unwrap();
        assert_eq!(m.groups, vec![Some(0..1), None]);
    }

    #[test]
    fn test_trailing_guards() {
        let fence = RegexPattern::compile(r"^\s*`{3,16}", None, Some("`")).unwrap();
        assert!(fence.match_at("```r", 0).is_some());
        assert!(fence.match_at(&"`".repeat(17), 0).is_none());

        let quote = RegexPattern::compile(r"^\s*>\s*", Some("-"), None).unwrap();
        assert!(quote.match_at("> - item", 0).is_some());
        assert!(quote.match_at("> item", 0).is_none());
    }
}
