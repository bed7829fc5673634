//! # Header Extraction
//!
//! Splits raw tune text into header fields and the tune body.
//!
//! Header lines have the form `letter:value` and may appear in any order before the
//! `K:` line. The key line ends the header; whatever follows the key value on that same
//! line, and every line after it, is the body. Field lines found after `K:` (lyrics,
//! notes, parts) are blanked out of the body so line numbers stay aligned with the input.
//!
//! | Field | Meaning             | Default     |
//! |-------|---------------------|-------------|
//! | `T:`  | title (first wins)  | `Untitled`  |
//! | `M:`  | meter               | 4/4         |
//! | `L:`  | default note length | 1/8         |
//! | `Q:`  | tempo, `unit=bpm`   | 120         |
//! | `R:`  | rhythm (dance type) | none        |
//! | `C:`  | composer            | none        |
//! | `K:`  | key                 | required    |
//!
//! The key value is the tonic word plus an optional mode word (`K:G major`, `K:D dor`).

use crate::error::TuneError;
use log::{debug, warn};
use num_rational::Rational64;
use serde::{Serialize, Serializer};

pub const DEFAULT_TEMPO: u16 = 120;

const DEFAULT_TITLE: &str = "Untitled";

/// Mode names by their significant first three letters (`m` alone is minor)
const MODE_PREFIXES: [&str; 9] = ["maj", "ion", "min", "aeo", "dor", "phr", "lyd", "mix", "loc"];

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

// Serialized as a `[beats, beat_type]` pair
impl Serialize for TimeSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.beats, self.beat_type).serialize(serializer)
    }
}

/// Tune metadata, fixed once the header has been read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TuneMetadata {
    pub title: String,
    /// False when the title is the `Untitled` placeholder
    #[serde(skip)]
    pub has_title: bool,
    pub time_signature: TimeSignature,
    pub key_signature: String,
    pub tempo: u16,
    /// Default note length as a fraction of a whole note
    #[serde(skip)]
    pub default_length: Rational64,
    #[serde(skip)]
    pub rhythm: Option<String>,
    #[serde(skip)]
    pub composer: Option<String>,
}

/// Header metadata plus the body text and where that body starts in the input
#[derive(Debug, Clone)]
pub struct ExtractedTune {
    pub metadata: TuneMetadata,
    pub body: String,
    pub body_line: usize,
    pub body_column: usize,
}

/// Split a `letter:value` line into its field letter and value.
fn field(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let letter = chars.next()?;
    if letter.is_ascii_alphabetic() && chars.next() == Some(':') {
        Some((letter, &line[2..]))
    } else {
        None
    }
}

fn is_mode_word(word: &str) -> bool {
    if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let lower = word.to_ascii_lowercase();
    lower == "m" || (lower.len() >= 3 && MODE_PREFIXES.contains(&&lower[..3]))
}

/// Length in bytes of the key name at the start of `value`: the tonic word, plus
/// the following word when it names a mode.
fn key_name_len(value: &str) -> usize {
    let tonic = value.split_whitespace().next().unwrap_or("");
    let after_tonic = &value[tonic.len()..];
    let gap = after_tonic.len() - after_tonic.trim_start().len();
    match after_tonic.split_whitespace().next() {
        Some(word) if !tonic.is_empty() && is_mode_word(word) => tonic.len() + gap + word.len(),
        _ => tonic.len(),
    }
}

/// Extract header metadata and the tune body from raw ABC text.
///
/// # Errors
/// - [`TuneError::EmptyInput`] for empty or whitespace-only text
/// - [`TuneError::MissingKey`] when no `K:` line exists
/// - [`TuneError::InvalidHeader`] for an unreadable `M:` or `L:` value
pub fn extract_header(input: &str) -> Result<ExtractedTune, TuneError> {
    if input.trim().is_empty() {
        return Err(TuneError::EmptyInput);
    }

    let mut title: Option<String> = None;
    let mut meter: Option<&str> = None;
    let mut length: Option<&str> = None;
    let mut tempo: Option<&str> = None;
    let mut rhythm: Option<String> = None;
    let mut composer: Option<String> = None;
    let mut key: Option<(&str, usize, usize)> = None;

    let mut lines = input.lines().enumerate();
    let mut body = String::new();

    for (index, line) in lines.by_ref() {
        let Some((letter, value)) = field(line) else {
            continue;
        };
        let value_trimmed = value.trim();
        match letter {
            'T' => {
                if title.is_none() && !value_trimmed.is_empty() {
                    title = Some(value_trimmed.to_string());
                }
            }
            'M' => meter = Some(value_trimmed),
            'L' => length = Some(value_trimmed),
            'Q' => tempo = Some(value_trimmed),
            'R' => rhythm = Some(value_trimmed.to_string()),
            'C' => {
                if composer.is_none() && !value_trimmed.is_empty() {
                    composer = Some(value_trimmed.to_string());
                }
            }
            'K' => {
                let value_start = value.trim_start();
                let leading = value.len() - value_start.len();
                let name = &value_start[..key_name_len(value_start)];
                // Byte offset of the remainder that belongs to the body
                let rest_start = 2 + leading + name.len();
                body.push_str(&line[rest_start..]);
                let column = line[..rest_start].chars().count() + 1;
                key = Some((name, index + 1, column));
                break;
            }
            _ => {}
        }
    }

    let (key_name, body_line, body_column) = key.ok_or(TuneError::MissingKey)?;

    for (index, line) in lines {
        body.push('\n');
        match field(line) {
            Some((letter, _)) => debug!("Skipping {}: field on line {}", letter, index + 1),
            None => body.push_str(line),
        }
    }

    let time_signature = match meter {
        Some(m) => parse_meter(m)?,
        None => TimeSignature::default(),
    };
    let default_length = match length {
        Some(l) => parse_note_length(l)?,
        None => Rational64::new(1, 8),
    };
    let tempo = tempo.map(parse_tempo).unwrap_or(DEFAULT_TEMPO);

    Ok(ExtractedTune {
        metadata: TuneMetadata {
            has_title: title.is_some(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            time_signature,
            key_signature: key_name.to_string(),
            tempo,
            default_length,
            rhythm: rhythm.filter(|r| !r.is_empty()),
            composer,
        },
        body,
        body_line,
        body_column,
    })
}

fn invalid(field: char, value: &str) -> TuneError {
    TuneError::InvalidHeader {
        field,
        value: value.to_string(),
    }
}

/// Parse an `M:` value: `N/D`, `C` (common time), `C|` (cut time) or `none`.
fn parse_meter(s: &str) -> Result<TimeSignature, TuneError> {
    match s {
        "C" | "" | "none" => return Ok(TimeSignature::default()),
        "C|" => {
            return Ok(TimeSignature {
                beats: 2,
                beat_type: 2,
            })
        }
        _ => {}
    }

    let (beats, beat_type) = s.split_once('/').ok_or_else(|| invalid('M', s))?;
    let beats: u8 = beats.trim().parse().map_err(|_| invalid('M', s))?;
    let beat_type: u8 = beat_type.trim().parse().map_err(|_| invalid('M', s))?;
    if beats == 0 || beat_type == 0 {
        return Err(invalid('M', s));
    }

    Ok(TimeSignature { beats, beat_type })
}

/// Parse an `L:` value such as `1/8` or `1`.
fn parse_note_length(s: &str) -> Result<Rational64, TuneError> {
    let (numer, denom) = match s.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (s, "1"),
    };
    let numer: u16 = numer.parse().map_err(|_| invalid('L', s))?;
    let denom: u16 = denom.parse().map_err(|_| invalid('L', s))?;
    if numer == 0 || denom == 0 {
        return Err(invalid('L', s));
    }
    Ok(Rational64::new(i64::from(numer), i64::from(denom)))
}

/// Parse a `Q:` value. Accepts `1/4=120`, `120` and `"Allegro" 1/4=120`.
///
/// Tempo only affects playback speed, so an unreadable value falls back to 120.
fn parse_tempo(s: &str) -> u16 {
    let bpm_part = match s.rsplit_once('=') {
        Some((_, bpm)) => bpm.trim(),
        None => s,
    };
    let digits: String = bpm_part.chars().take_while(|c| c.is_ascii_digit()).collect();

    match digits.parse::<u16>() {
        Ok(bpm) if bpm > 0 => bpm,
        _ => {
            warn!("Unreadable tempo '{}', using {}", s, DEFAULT_TEMPO);
            DEFAULT_TEMPO
        }
    }
}
