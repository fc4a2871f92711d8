//! Editor-side integration
//!
//! Contains the pieces an editor needs around the line tokenizer:
//! - Text buffer management (using ropey)
//! - A per-line token cache that re-scans only what an edit affects
//! - Bracket matching and closing-bracket outdent

pub mod brace;
pub mod buffer;
pub mod document;

pub use brace::{auto_outdent, check_outdent, find_matching_brace, OutdentEdit};
pub use buffer::{LineEnding, TextBuffer};
pub use document::Document;

/// Row and character column in a document, both 0-indexed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}
