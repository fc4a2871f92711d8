//! Hand-written matchers for constructs that need back-references
//!
//! Code spans and strong/emphasis markers close with the same delimiter run
//! they opened with, which the `regex` crate cannot express. Each scanner
//! reports the same capture groups the rule's token list expects.

use crate::grammar::{MatchSpans, Scanner};

/// `` `code` `` with a delimiter run of any length
pub const CODE_SPAN: Scanner = Scanner {
    name: "code_span",
    groups: 3,
    scan: code_span,
};

/// `**strong**` and `***strong***`
pub const STRONG_STARS: Scanner = Scanner {
    name: "strong_stars",
    groups: 3,
    scan: strong_stars,
};

/// `__strong__` preceded by whitespace or the line start
pub const STRONG_UNDERSCORE: Scanner = Scanner {
    name: "strong_underscore",
    groups: 4,
    scan: strong_underscore,
};

/// `*emphasis*`
pub const EMPHASIS_STARS: Scanner = Scanner {
    name: "emphasis_stars",
    groups: 1,
    scan: emphasis_stars,
};

/// `_emphasis_` preceded by whitespace or the line start
pub const EMPHASIS_UNDERSCORE: Scanner = Scanner {
    name: "emphasis_underscore",
    groups: 2,
    scan: emphasis_underscore,
};

fn count_run(line: &str, at: usize, byte: u8) -> usize {
    line.as_bytes()[at..]
        .iter()
        .take_while(|&&b| b == byte)
        .count()
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Word boundary right after an underscore ending at `at`
fn boundary_after(line: &str, at: usize) -> bool {
    line[at..].chars().next().map_or(true, |c| !is_word(c))
}

/// Opening run of 2 or 3 delimiters followed by a non-blank, non-delimiter
fn strong_opener(line: &str, at: usize, byte: u8) -> Option<usize> {
    let n = count_run(line, at, byte);
    if !(2..=3).contains(&n) {
        return None;
    }
    let next = line[at + n..].chars().next()?;
    (!next.is_whitespace()).then_some(n)
}

/// Whitespace before an underscore marker; may be empty only at line start
fn underscore_lead(line: &str, offset: usize) -> Option<usize> {
    let ws: usize = line[offset..]
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if ws == 0 && offset != 0 {
        return None;
    }
    Some(offset + ws)
}

/// Candidate closing positions: every character start after the first
/// content character
fn close_candidates(line: &str, open: usize) -> impl Iterator<Item = usize> + '_ {
    line[open..].char_indices().skip(1).map(move |(i, _)| open + i)
}

fn code_span(line: &str, offset: usize) -> Option<MatchSpans> {
    let run = count_run(line, offset, b'`');
    for n in (1..=run).rev() {
        let open = offset + n;
        for (i, c) in line[open..].char_indices() {
            if c == '`' {
                continue;
            }
            let end = open + i + c.len_utf8();
            if count_run(line, end, b'`') >= n {
                return Some(MatchSpans::new(
                    offset,
                    end + n,
                    vec![Some(offset..open), Some(open..end), Some(end..end + n)],
                ));
            }
        }
    }
    None
}

fn strong_stars(line: &str, offset: usize) -> Option<MatchSpans> {
    let n = strong_opener(line, offset, b'*')?;
    let open = offset + n;
    let close = close_candidates(line, open).find(|&at| count_run(line, at, b'*') >= n)?;
    Some(MatchSpans::new(
        offset,
        close + n,
        vec![Some(offset..open), Some(open..close), Some(close..close + n)],
    ))
}

fn strong_underscore(line: &str, offset: usize) -> Option<MatchSpans> {
    let lead = underscore_lead(line, offset)?;
    let n = strong_opener(line, lead, b'_')?;
    let open = lead + n;
    let close = close_candidates(line, open)
        .find(|&at| count_run(line, at, b'_') >= n && boundary_after(line, at + n))?;
    Some(MatchSpans::new(
        offset,
        close + n,
        vec![
            Some(offset..lead),
            Some(lead..open),
            Some(open..close),
            Some(close..close + n),
        ],
    ))
}

fn emphasis_stars(line: &str, offset: usize) -> Option<MatchSpans> {
    if !line[offset..].starts_with('*') {
        return None;
    }
    let next = line[offset + 1..].chars().next()?;
    if next.is_whitespace() || next == '*' {
        return None;
    }
    let from = offset + 1 + next.len_utf8();
    let close = from + line[from..].find('*')?;
    Some(MatchSpans::new(offset, close + 1, vec![Some(offset..close + 1)]))
}

fn emphasis_underscore(line: &str, offset: usize) -> Option<MatchSpans> {
    let lead = underscore_lead(line, offset)?;
    if !line[lead..].starts_with('_') {
        return None;
    }
    let next = line[lead + 1..].chars().next()?;
    if next.is_whitespace() || next == '_' {
        return None;
    }
    let from = lead + 1 + next.len_utf8();
    let close = line[from..]
        .match_indices('_')
        .map(|(i, _)| from + i)
        .find(|&at| boundary_after(line, at + 1))?;
    Some(MatchSpans::new(
        offset,
        close + 1,
        vec![Some(offset..lead), Some(lead..close + 1)],
    ))
}
