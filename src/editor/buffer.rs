//! Rope-backed text storage
//!
//! Lines are stored with LF endings internally; the original line ending is
//! remembered so the text can be written back the way it came in.

use super::Position;
use ropey::Rope;

/// Line ending style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style line endings (LF: \n)
    #[default]
    Lf,
    /// Windows-style line endings (CRLF: \r\n)
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }

    /// Detect line ending from text
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }
}

/// Text buffer addressed by row and character column
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    line_ending: LineEnding,
}

impl TextBuffer {
    /// Create a buffer from a string, normalizing line endings to LF
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(&text.replace("\r\n", "\n")),
            line_ending: LineEnding::detect(text),
        }
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Number of rows; an empty buffer or a trailing newline still counts a row
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Text of a row without its line terminator
    pub fn line(&self, row: usize) -> Option<String> {
        if row >= self.rope.len_lines() {
            return None;
        }
        let mut text = self.rope.line(row).to_string();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    /// Length of a row in characters, excluding the terminator
    pub fn line_len(&self, row: usize) -> Option<usize> {
        self.line(row).map(|s| s.chars().count())
    }

    /// Char index of a position; the column is clamped to the row's length
    pub fn position_to_char(&self, pos: Position) -> Option<usize> {
        let len = self.line_len(pos.row)?;
        Some(self.rope.line_to_char(pos.row) + pos.column.min(len))
    }

    pub fn char_to_position(&self, char_idx: usize) -> Position {
        let char_idx = char_idx.min(self.rope.len_chars());
        let row = self.rope.char_to_line(char_idx);
        Position::new(row, char_idx - self.rope.line_to_char(row))
    }

    /// Position just past the last character
    pub fn end(&self) -> Position {
        self.char_to_position(self.rope.len_chars())
    }

    /// Insert text; returns the position right after it
    pub fn insert(&mut self, at: Position, text: &str) -> Position {
        let idx = self
            .position_to_char(at)
            .unwrap_or_else(|| self.rope.len_chars());
        let text = text.replace("\r\n", "\n");
        self.rope.insert(idx, &text);
        self.char_to_position(idx + text.chars().count())
    }

    /// Delete the text between two positions
    pub fn delete(&mut self, start: Position, end: Position) {
        let len = self.rope.len_chars();
        let start = self.position_to_char(start).unwrap_or(len);
        let end = self.position_to_char(end).unwrap_or(len);
        if start < end {
            self.rope.remove(start..end);
        }
    }

    /// Replace the text between two positions; returns the end of the new text
    pub fn replace(&mut self, start: Position, end: Position, text: &str) -> Position {
        self.delete(start, end);
        self.insert(start, text)
    }

    /// Replace the whole contents
    pub fn set_text(&mut self, text: &str) {
        self.line_ending = LineEnding::detect(text);
        self.rope = Rope::from_str(&text.replace("\r\n", "\n"));
    }

    /// Contents with the original line endings restored
    pub fn text(&self) -> String {
        let content = self.rope.to_string();
        match self.line_ending {
            LineEnding::Lf => content,
            LineEnding::Crlf => content.replace('\n', LineEnding::Crlf.as_str()),
        }
    }
}
