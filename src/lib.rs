//! Incremental rule-based Markdown tokenizer
//!
//! Lines are scanned one at a time by a state machine of ordered regex rules.
//! Each scan starts from the state and [`Context`] the previous line ended
//! with, so an editor only re-tokenizes the lines an edit actually affects.
//!
//! ```no_run
//! use markdown_highlight::{Context, EngineConfig, Tokenizer};
//!
//! let tokenizer = Tokenizer::markdown(EngineConfig::default())?;
//! let line = tokenizer.scan_line("# Title", tokenizer.initial_state(), &Context::default())?;
//! for token in &line.tokens {
//!     println!("{} {:?}", token.kind, token.text);
//! }
//! # Ok::<(), markdown_highlight::AppError>(())
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod grammar;
pub mod markdown;
pub mod token;
pub mod tokenizer;

pub use config::EngineConfig;
pub use editor::{Document, Position};
pub use error::{AppError, AppResult, ConfigError, GrammarError, ScanError};
pub use grammar::{Grammar, StateId};
pub use token::{Token, TokenKind};
pub use tokenizer::{Context, TokenizedLine, Tokenizer};
