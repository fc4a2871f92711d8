//! Incrementally tokenized document
//!
//! A [`Document`] keeps one cached [`TokenizedLine`] per row. Edits drop the
//! cache entries of the rows they touch and mark everything from the first
//! touched row as dirty. [`Document::refresh`] re-scans forward from there and
//! stops as soon as a re-scanned line ends in the same state and context it
//! ended in before, since every later line would come out unchanged.

use super::brace;
use super::buffer::TextBuffer;
use super::Position;
use crate::error::ScanResult;
use crate::grammar::StateId;
use crate::tokenizer::{Context, TokenizedLine, Tokenizer};
use std::iter;

/// Text buffer plus a per-line token cache
#[derive(Debug, Clone)]
pub struct Document {
    buffer: TextBuffer,
    tokenizer: Tokenizer,
    lines: Vec<Option<TokenizedLine>>,
    /// First row whose cache entry may be stale
    dirty_from: Option<usize>,
}

impl Document {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self::with_text("", tokenizer)
    }

    pub fn with_text(text: &str, tokenizer: Tokenizer) -> Self {
        let buffer = TextBuffer::from_text(text);
        let rows = buffer.len_lines();
        Self {
            buffer,
            tokenizer,
            lines: vec![None; rows],
            dirty_from: Some(0),
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Option changes apply to lines scanned afterwards; call
    /// [`Document::invalidate_all`] to re-highlight everything
    pub fn tokenizer_mut(&mut self) -> &mut Tokenizer {
        &mut self.tokenizer
    }

    pub fn line_count(&self) -> usize {
        self.buffer.len_lines()
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Whether any row needs re-scanning
    pub fn is_dirty(&self) -> bool {
        self.dirty_from.is_some()
    }

    /// Cached tokens of a row, which may be missing or stale until refreshed
    pub fn cached(&self, row: usize) -> Option<&TokenizedLine> {
        self.lines.get(row).and_then(Option::as_ref)
    }

    /// Up-to-date tokens of a row
    pub fn tokens(&mut self, row: usize) -> ScanResult<Option<&TokenizedLine>> {
        self.refresh()?;
        Ok(self.cached(row))
    }

    /// Up-to-date tokens of every row
    pub fn tokenized_lines(&mut self) -> ScanResult<Vec<&TokenizedLine>> {
        self.refresh()?;
        Ok(self.lines.iter().flatten().collect())
    }

    /// Insert text; returns the position right after it
    pub fn insert(&mut self, at: Position, text: &str) -> Position {
        let at = self.clamp(at);
        let end = self.buffer.insert(at, text);
        self.splice(at.row, at.row, end.row);
        end
    }

    /// Delete the text between two positions
    pub fn delete(&mut self, start: Position, end: Position) {
        let (start, end) = (self.clamp(start), self.clamp(end));
        if end <= start {
            return;
        }
        self.buffer.delete(start, end);
        self.splice(start.row, end.row, start.row);
    }

    /// Replace the text between two positions; returns the end of the new text
    pub fn replace(&mut self, start: Position, end: Position, text: &str) -> Position {
        self.delete(start, end);
        self.insert(start, text)
    }

    /// Replace the whole text
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.lines = vec![None; self.buffer.len_lines()];
        self.dirty_from = Some(0);
    }

    /// Drop every cached line
    pub fn invalidate_all(&mut self) {
        self.lines.iter_mut().for_each(|line| *line = None);
        self.dirty_from = Some(0);
    }

    /// Re-scan dirty rows; returns how many rows were scanned
    pub fn refresh(&mut self) -> ScanResult<usize> {
        let Some(from) = self.dirty_from.take() else {
            return Ok(0);
        };
        let total = self.lines.len();
        let mut row = from;
        let mut scanned = 0;

        while row < total {
            let (state, context) = self.start_of(row);
            let text = self.buffer.line(row).unwrap_or_default();
            let line = match self.tokenizer.scan_line(&text, state, &context) {
                Ok(line) => line,
                Err(err) => {
                    self.dirty_from = Some(row);
                    return Err(err);
                }
            };

            let settled = matches!(
                &self.lines[row],
                Some(old) if old.end_state == line.end_state && old.end_context == line.end_context
            );
            self.lines[row] = Some(line);
            scanned += 1;
            row += 1;

            if settled {
                // Later rows are valid up to the next one an edit dropped
                match self.lines[row..].iter().position(Option::is_none) {
                    Some(gap) => row += gap,
                    None => break,
                }
            }
        }

        log::debug!(
            "Refreshed {} of {} lines starting at row {}",
            scanned,
            total,
            from
        );
        Ok(scanned)
    }

    /// Position of the bracket matching the one at `pos`
    pub fn find_matching_brace(&mut self, pos: Position) -> ScanResult<Option<Position>> {
        self.refresh()?;
        Ok(brace::find_matching_brace(self.lines.iter().flatten(), pos))
    }

    /// State and context a row starts with
    fn start_of(&self, row: usize) -> (StateId, Context) {
        match row.checked_sub(1).and_then(|prev| self.cached(prev)) {
            Some(prev) => (prev.end_state, prev.end_context.clone()),
            None => (self.tokenizer.initial_state(), Context::default()),
        }
    }

    fn clamp(&self, pos: Position) -> Position {
        match self.buffer.position_to_char(pos) {
            Some(idx) => self.buffer.char_to_position(idx),
            None => self.buffer.end(),
        }
    }

    /// Rows `first..=old_last` became `first..=new_last`
    fn splice(&mut self, first: usize, old_last: usize, new_last: usize) {
        let old_last = old_last.min(self.lines.len().saturating_sub(1));
        let fresh = iter::repeat(None).take(new_last - first + 1);
        if first < self.lines.len() {
            self.lines.splice(first..=old_last, fresh);
        } else {
            self.lines.extend(fresh);
        }
        debug_assert_eq!(self.lines.len(), self.buffer.len_lines());
        self.dirty_from = Some(self.dirty_from.map_or(first, |d| d.min(first)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::token::TokenKind;

    fn document(text: &str) -> Document {
        Document::with_text(text, Tokenizer::markdown(EngineConfig::default()).unwrap())
    }

    fn fresh_tokens(doc: &Document) -> Vec<TokenizedLine> {
        let text = doc.buffer().text();
        let lines: Vec<String> = (0..doc.line_count())
            .map(|row| doc.buffer().line(row).unwrap())
            .collect();
        assert_eq!(lines.join("\n"), text);
        doc.tokenizer()
            .scan_lines(lines.iter().map(String::as_str))
            .unwrap()
    }

    fn cached_tokens(doc: &mut Document) -> Vec<TokenizedLine> {
        doc.tokenized_lines()
            .unwrap()
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn test_initial_refresh_scans_everything() {
        let mut doc = document("a\nb\nc");
        assert!(doc.is_dirty());
        assert_eq!(doc.refresh().unwrap(), 3);
        assert!(!doc.is_dirty());
        assert_eq!(doc.refresh().unwrap(), 0);
    }

    #[test]
    fn test_local_edit_stops_early() {
        let mut doc = document("one\ntwo\nthree\nfour\nfive");
        doc.refresh().unwrap();

        doc.insert(Position::new(1, 3), "!");
        // the edited row has no cached end to compare against; the row after
        // it ends where it did before, which settles the rest
        assert_eq!(doc.refresh().unwrap(), 2);
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));
    }

    #[test]
    fn test_opening_a_fence_rescans_following_lines() {
        let mut doc = document("text\nx <- 1\ny\nend");
        doc.refresh().unwrap();
        assert_eq!(doc.cached(1).unwrap().tokens[0].kind, TokenKind::Text);

        doc.insert(Position::new(0, 0), "```\n");
        let scanned = doc.refresh().unwrap();
        assert_eq!(scanned, 5);
        assert_eq!(doc.cached(2).unwrap().tokens[0].kind, TokenKind::Code);
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));

        // closing it again restores the tail
        doc.insert(Position::new(2, 6), "\n```");
        doc.refresh().unwrap();
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));
        assert_eq!(doc.cached(4).unwrap().tokens[0].kind, TokenKind::Text);
    }

    #[test]
    fn test_multi_line_delete() {
        let mut doc = document("```\ncode\n```\nafter\n$$\nmath\n$$");
        doc.refresh().unwrap();

        doc.delete(Position::new(0, 0), Position::new(2, 3));
        assert_eq!(doc.line_count(), 5);
        doc.refresh().unwrap();
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));
    }

    #[test]
    fn test_two_edits_before_refresh() {
        let mut doc = document("a\nb\nc\nd\ne\nf");
        doc.refresh().unwrap();

        doc.insert(Position::new(1, 1), "1");
        doc.insert(Position::new(4, 1), "\n# h");
        doc.refresh().unwrap();
        assert!(doc.lines.iter().all(Option::is_some));
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));
    }

    #[test]
    fn test_replace_and_set_text() {
        let mut doc = document("::: a\n:::\n::: b");
        doc.refresh().unwrap();
        doc.replace(Position::new(0, 4), Position::new(0, 5), "z");
        assert_eq!(doc.text(), "::: z\n:::\n::: b");
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));

        doc.set_text("new\ntext");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));
    }

    #[test]
    fn test_option_change_needs_invalidation() {
        let mut doc = document("::: a");
        doc.refresh().unwrap();
        doc.tokenizer_mut().set_rainbow_enabled(false);
        assert_eq!(
            doc.tokens(0).unwrap().unwrap().tokens[0].kind,
            TokenKind::FencedDiv(0)
        );

        doc.invalidate_all();
        assert_eq!(
            doc.tokens(0).unwrap().unwrap().tokens[0].kind,
            TokenKind::KeywordOperator
        );
    }

    #[test]
    fn test_edit_past_end_appends() {
        let mut doc = document("a");
        let end = doc.insert(Position::new(9, 9), "\nb");
        assert_eq!(end, Position::new(1, 1));
        assert_eq!(doc.text(), "a\nb");
        assert_eq!(cached_tokens(&mut doc), fresh_tokens(&doc));
    }
}
