//! R Markdown grammar
//!
//! This module provides the rule tables, hand-written scanners and
//! context-sensitive handlers for highlighting R Markdown documents,
//! including pandoc fenced divs, MathJax blocks and slide field headers.

pub mod handlers;
pub mod rules;
pub mod scanners;

pub use rules::{declaration, FENCE_STATE_PREFIX, MAX_FENCE_WIDTH, MIN_FENCE_WIDTH};

use crate::error::GrammarResult;
use crate::grammar::{compile, Grammar};

/// Compile the R Markdown grammar
pub fn grammar() -> GrammarResult<Grammar> {
    compile(&declaration())
}
