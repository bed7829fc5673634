//! # abc-import
//!
//! Parser for ABC-notation folk tunes and the tooling that turns them into practice songs.
//!
//! ## Pipeline
//! 1. [`header`] splits the text into header fields and the tune body
//! 2. [`key`] turns the `K:` value into standing accidentals
//! 3. [`lexer`] tokenizes the body
//! 4. [`resolver`] computes pitch and length for each note
//! 5. [`timeline`] places notes in time (bars, ties, chords)
//! 6. [`tune`] packages the result
//!
//! Parsing is a pure function of the input text and safe to call from any thread.
//!
//! ## Example
//! ```rust
//! use abc_import::parse_tune;
//!
//! let tune = parse_tune("X:1\nT:Simple Melody\nM:4/4\nL:1/4\nK:C\nCDEF|GABc|").unwrap();
//! assert_eq!(tune.notes.len(), 8);
//! assert_eq!(tune.notes[7].note(), 72);
//! ```

pub mod config;
pub mod error;
pub mod header;
pub mod import;
pub mod key;
pub mod lexer;
pub mod resolver;
pub mod song;
pub mod timeline;
pub mod tune;
pub mod tunebook;

pub use config::ImportConfig;
pub use error::*;
pub use header::{TimeSignature, TuneMetadata};
pub use song::{convert_tune, Song};
pub use tune::{NoteEvent, Tune, TuneResponse};
pub use tunebook::split_tunebook;

use header::extract_header;
use key::resolve_key;
use lexer::Lexer;
use timeline::Timeline;

/// Parse ABC tune text into metadata and a timed note sequence.
///
/// # Errors
/// Returns [`TuneError`] for empty input, a missing key, malformed body text, or a
/// body with no notes. No partial result is ever returned.
pub fn parse_tune(input: &str) -> Result<Tune, TuneError> {
    let extracted = extract_header(input)?;
    let key = resolve_key(&extracted.metadata.key_signature);

    let mut lexer = Lexer::with_origin(&extracted.body, extracted.body_line, extracted.body_column);
    let tokens = lexer.tokenize()?;
    let notes = Timeline::new(&key, extracted.metadata.default_length).run(&tokens)?;

    Ok(tune::assemble(extracted.metadata, notes))
}

/// Parse ABC tune text and render the outcome as JSON: the tune on success,
/// `{"error": "..."}` on failure.
pub fn parse_tune_json(input: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&TuneResponse::from(parse_tune(input)))
}
