//! Bracket matching and closing-bracket outdent
//!
//! Only `{` and `}` held by brace operator tokens take part in matching, so
//! a `{` inside a code span or a heading is ignored. Parentheses and square
//! brackets are never brace tokens in this grammar.

use super::document::Document;
use super::Position;
use crate::error::ScanResult;
use crate::tokenizer::TokenizedLine;

fn partner(ch: char) -> Option<(char, bool)> {
    match ch {
        '{' => Some(('}', true)),
        '}' => Some(('{', false)),
        _ => None,
    }
}

/// Every bracket character held by a brace token, in document order
fn brace_chars<'a>(lines: impl IntoIterator<Item = &'a TokenizedLine>) -> Vec<(Position, char)> {
    let mut out = Vec::new();
    for (row, line) in lines.into_iter().enumerate() {
        for token in line.tokens.iter().filter(|t| t.kind.is_brace()) {
            for (i, ch) in token.text.chars().enumerate() {
                if partner(ch).is_some() {
                    out.push((Position::new(row, token.column + i), ch));
                }
            }
        }
    }
    out
}

/// Find the bracket matching the one at `pos`
///
/// `lines` are the tokenized rows of a document, starting at row 0.
pub fn find_matching_brace<'a>(
    lines: impl IntoIterator<Item = &'a TokenizedLine>,
    pos: Position,
) -> Option<Position> {
    let braces = brace_chars(lines);
    let index = braces.iter().position(|(p, _)| *p == pos)?;
    let ch = braces[index].1;
    let (target, opening) = partner(ch)?;

    let mut depth = 0usize;
    let candidates: Box<dyn Iterator<Item = &(Position, char)>> = if opening {
        Box::new(braces[index + 1..].iter())
    } else {
        Box::new(braces[..index].iter().rev())
    };
    for &(p, c) in candidates {
        if c == ch {
            depth += 1;
        } else if c == target {
            if depth == 0 {
                return Some(p);
            }
            depth -= 1;
        }
    }
    None
}

fn is_bracket_close(ch: char) -> bool {
    matches!(ch, '}' | ')' | ']')
}

/// Whether typing `input` on `line` may require re-indenting the line
pub fn check_outdent(line: &str, input: &str) -> bool {
    // bracket typed on a blank line
    if !line.is_empty()
        && line.chars().all(char::is_whitespace)
        && input
            .trim_start()
            .starts_with(|c: char| c == '{' || is_bracket_close(c))
    {
        return true;
    }
    // newline on a line holding only `}`
    if line.trim() == "}" && input == "\n" {
        return true;
    }
    // newline after a line ending in `}`
    line.trim_end().ends_with('}') && input.contains('\n')
}

/// Re-indentation of the leading whitespace of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdentEdit {
    pub row: usize,
    /// Columns `0..end_column` are replaced
    pub end_column: usize,
    pub indent: String,
}

impl OutdentEdit {
    /// Apply the edit to `doc`
    pub fn apply(&self, doc: &mut Document) -> Position {
        doc.replace(
            Position::new(self.row, 0),
            Position::new(self.row, self.end_column),
            &self.indent,
        )
    }
}

fn indent_of(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

/// Indentation fix for a row starting with a brace
///
/// A closing `}` is aligned with the line holding its opening brace; an
/// opening `{` takes the indentation of the row above.
pub fn auto_outdent(doc: &mut Document, row: usize) -> ScanResult<Option<OutdentEdit>> {
    if row == 0 {
        return Ok(None);
    }
    let Some(line) = doc.buffer().line(row) else {
        return Ok(None);
    };
    let indent_len = line.chars().take_while(|c| c.is_whitespace()).count();
    let first = line.chars().nth(indent_len);

    if first == Some('}') {
        let close = Position::new(row, indent_len);
        let Some(open) = doc.find_matching_brace(close)? else {
            return Ok(None);
        };
        if open.row == row {
            return Ok(None);
        }
        let indent = doc.buffer().line(open.row).map(|l| indent_of(&l)).unwrap_or_default();
        return Ok(Some(OutdentEdit {
            row,
            end_column: indent_len,
            indent,
        }));
    }

    if first == Some('{') {
        let indent = doc.buffer().line(row - 1).map(|l| indent_of(&l)).unwrap_or_default();
        return Ok(Some(OutdentEdit {
            row,
            end_column: indent_len,
            indent,
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::tokenizer::Tokenizer;

    fn document(text: &str) -> Document {
        Document::with_text(text, Tokenizer::markdown(EngineConfig::default()).unwrap())
    }

    #[test]
    fn test_match_across_lines() {
        let mut doc = document("{\n  x\n}");
        assert_eq!(
            doc.find_matching_brace(Position::new(2, 0)).unwrap(),
            Some(Position::new(0, 0))
        );
        assert_eq!(
            doc.find_matching_brace(Position::new(0, 0)).unwrap(),
            Some(Position::new(2, 0))
        );
    }

    #[test]
    fn test_nested_braces() {
        let mut doc = document("{ {\n} }");
        assert_eq!(
            doc.find_matching_brace(Position::new(0, 2)).unwrap(),
            Some(Position::new(1, 0))
        );
        assert_eq!(
            doc.find_matching_brace(Position::new(1, 2)).unwrap(),
            Some(Position::new(0, 0))
        );
    }

    #[test]
    fn test_braces_in_code_are_ignored() {
        let mut doc = document("{\n`}`\n}");
        assert_eq!(doc.find_matching_brace(Position::new(1, 1)).unwrap(), None);
        assert_eq!(
            doc.find_matching_brace(Position::new(0, 0)).unwrap(),
            Some(Position::new(2, 0))
        );
    }

    #[test]
    fn test_unmatched_brace() {
        let mut doc = document("{ x");
        assert_eq!(doc.find_matching_brace(Position::new(0, 0)).unwrap(), None);
        assert_eq!(doc.find_matching_brace(Position::new(0, 2)).unwrap(), None);
    }

    #[test]
    fn test_only_braces_are_matched() {
        let mut doc = document("{ (
) }");
        assert_eq!(doc.find_matching_brace(Position::new(0, 2)).unwrap(), None);
        assert_eq!(doc.find_matching_brace(Position::new(1, 0)).unwrap(), None);
        assert_eq!(
            doc.find_matching_brace(Position::new(1, 2)).unwrap(),
            Some(Position::new(0, 0))
        );

        let mut doc = document("(
  x
    )");
        assert_eq!(auto_outdent(&mut doc, 2).unwrap(), None);
    }

    #[test]
    fn test_check_outdent() {
        assert!(check_outdent("    ", "}"));
        assert!(check_outdent("  ", " ]"));
        assert!(!check_outdent("", "}"));
        assert!(!check_outdent("  x", "}"));
        assert!(check_outdent("  }  ", "\n"));
        assert!(check_outdent("f(x) }", "\n  "));
        assert!(!check_outdent("f(x)", "\n"));
    }

    #[test]
    fn test_closing_brace_aligns_with_opener() {
        let mut doc = document("  {\n    x\n      }");
        let edit = auto_outdent(&mut doc, 2).unwrap().unwrap();
        assert_eq!(
            edit,
            OutdentEdit {
                row: 2,
                end_column: 6,
                indent: "  ".to_string(),
            }
        );
        edit.apply(&mut doc);
        assert_eq!(doc.text(), "  {\n    x\n  }");
    }

    #[test]
    fn test_opening_brace_takes_previous_indent() {
        let mut doc = document("    a\n{");
        let edit = auto_outdent(&mut doc, 1).unwrap().unwrap();
        assert_eq!(edit.indent, "    ");
        edit.apply(&mut doc);
        assert_eq!(doc.text(), "    a\n    {");
    }

    #[test]
    fn test_no_outdent_on_first_row_or_same_row() {
        let mut doc = document("}\n{ }");
        assert_eq!(auto_outdent(&mut doc, 0).unwrap(), None);
        let mut doc = document("x\n  a");
        assert_eq!(auto_outdent(&mut doc, 1).unwrap(), None);
    }
}
