//! # Error Types
//!
//! This module defines the error types for the ABC tune parser and the import tooling.
//!
//! Parsing returns [`TuneError`] as a value; batch callers log it, skip the tune and
//! carry on.
//!
//! ## Error Types
//! - `EmptyInput` - Input is empty or whitespace-only
//! - `MissingKey` - No `K:` header anywhere in the input
//! - `NoNotes` - The body parsed cleanly but produced nothing playable
//! - `Syntax` - Malformed body fragment, with line and column in the original input
//! - `InvalidHeader` - An `M:` or `L:` value that cannot be read
//!
//! ## Usage
//! ```rust
//! use abc_import::{parse_tune, TuneError};
//!
//! match parse_tune("X:1\nT:Reel\nK:D\n|: dA | ") {
//!     Ok(tune) => println!("{} notes", tune.notes.len()),
//!     Err(TuneError::Syntax { line, column, message }) => {
//!         eprintln!("Syntax error at {}:{}: {}", line, column, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TuneError {
    /// The input held no text at all.
    ///
    /// # Example
    /// ```
    /// # use abc_import::TuneError;
    /// assert_eq!(TuneError::EmptyInput.to_string(), "Empty input: no tune text provided");
    /// ```
    #[error("Empty input: no tune text provided")]
    EmptyInput,

    /// No `K:` header line was found, so pitches cannot be resolved.
    #[error("Missing key: no K: header found")]
    MissingKey,

    /// The tune body produced zero note events.
    #[error("No notes: the tune body contains nothing playable")]
    NoNotes,

    /// Malformed body fragment.
    ///
    /// Line and column are 1-based and refer to the original input text, not the
    /// extracted body.
    ///
    /// # Example
    /// ```
    /// # use abc_import::TuneError;
    /// let err = TuneError::Syntax {
    ///     line: 6,
    ///     column: 3,
    ///     message: "Unterminated chord".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Syntax error at line 6, column 3: Unterminated chord");
    /// ```
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// An `M:` or `L:` value that cannot be read.
    #[error("Invalid header {field}: '{value}'")]
    InvalidHeader { field: char, value: String },
}

/// Errors raised by the archive import tooling around the parser.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid import config: {0}")]
    Config(#[from] serde_yaml::Error),

    /// A config value that parses but cannot be used.
    #[error("Invalid import setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("Failed to serialize song: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tune(#[from] TuneError),

    /// The tune parsed, but is too short to be worth practicing.
    #[error("Too few notes: {found} (minimum {minimum})")]
    TooFewNotes { found: usize, minimum: usize },
}
