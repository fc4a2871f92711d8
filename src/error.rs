//! Error types for the Markdown highlighter
//!
//! Errors are grouped by where they surface: grammar construction, line
//! scanning, and configuration. Scan-time anomalies such as "no rule matched"
//! are not errors at all; the engine recovers from them on its own.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type encompassing all error categories
#[derive(Error, Debug)]
pub enum AppError {
    /// Grammar construction errors
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// Host errors raised while scanning
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors in a grammar declaration, detected at compile time
#[derive(Error, Debug)]
pub enum GrammarError {
    /// Two states share a name
    #[error("Duplicate state: {state}")]
    DuplicateState { state: String },

    /// A state compiled to an empty rule list
    #[error("State {state} has no rules")]
    EmptyState { state: String },

    /// A rule transitions to a state that does not exist
    #[error("Rule {index} of state {state} transitions to unknown state {target}")]
    UnknownNextState {
        state: String,
        index: usize,
        target: String,
    },

    /// An include directive names a state that does not exist
    #[error("State {state} includes unknown state {target}")]
    UnknownInclude { state: String, target: String },

    /// Include directives form a cycle
    #[error("Include cycle through state {state}")]
    IncludeCycle { state: String },

    /// A regex pattern failed to compile
    #[error("Invalid pattern {pattern:?} in state {state}")]
    InvalidPattern {
        state: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A token list disagrees with the pattern's capture groups
    #[error("Rule {index} of state {state} lists {tokens} token kinds for {groups} capture groups")]
    CaptureMismatch {
        state: String,
        index: usize,
        tokens: usize,
        groups: usize,
    },

    /// The initial state is not declared
    #[error("Initial state {state} is not declared")]
    UnknownInitialState { state: String },

    /// The parametrized fence family has an unusable width range
    #[error("Invalid fence width range {min}..={max}")]
    InvalidFenceRange { min: usize, max: usize },
}

/// Errors reported to the host calling the scanner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The start state id does not belong to this grammar
    #[error("Unknown start state id: {id}")]
    UnknownState { id: usize },

    /// The start state name does not belong to this grammar
    #[error("Unknown start state: {name}")]
    UnknownStateName { name: String },
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error loading configuration file
    #[error("Could not load configuration: {path}")]
    LoadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error saving configuration
    #[error("Could not save configuration: {path}")]
    SaveError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing configuration
    #[error("Invalid configuration format: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Configuration directory error
    #[error("Could not access configuration directory")]
    DirectoryError,
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for grammar construction
pub type GrammarResult<T> = Result<T, GrammarError>;

/// Result type alias for scanning
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_error_display() {
        let err = GrammarError::UnknownNextState {
            state: "start".to_string(),
            index: 4,
            target: "nowhere".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start"));
        assert!(msg.contains("nowhere"));
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::UnknownStateName {
            name: "bogus".to_string(),
        };
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let err = ConfigError::DirectoryError;
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Config(_)));
    }
}
