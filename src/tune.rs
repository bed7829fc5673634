//! Parsed tune types and the success/failure response shape.
//!
//! A [`Tune`] serializes as
//! `{ title, timeSignature: [n, d], keySignature, tempo, notes: [{ note, startBeat, durationBeats }] }`
//! and a failure as `{ error }`, so consumers of the JSON can tell the two apart by shape.

use crate::error::TuneError;
use crate::header::TuneMetadata;
use num_rational::Rational64;
use serde::Serialize;

fn beats_to_f64(beats: Rational64) -> f64 {
    *beats.numer() as f64 / *beats.denom() as f64
}

/// One sounding note: absolute pitch, start and length in beats (quarter notes).
///
/// Events are only built by the timeline, so every pitch comes from the diatonic
/// pitch formula.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    note: u8,
    start_beat: f64,
    duration_beats: f64,
}

impl NoteEvent {
    pub(crate) fn new(note: u8, start: Rational64, duration: Rational64) -> Self {
        Self {
            note,
            start_beat: beats_to_f64(start),
            duration_beats: beats_to_f64(duration),
        }
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn start_beat(&self) -> f64 {
        self.start_beat
    }

    pub fn duration_beats(&self) -> f64 {
        self.duration_beats
    }

    /// Beat at which the note stops sounding
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration_beats
    }
}

/// A successfully parsed tune
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tune {
    #[serde(flatten)]
    pub metadata: TuneMetadata,
    pub notes: Vec<NoteEvent>,
}

/// Serializable outcome of one parse
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TuneResponse {
    Success(Tune),
    Failure { error: String },
}

impl From<Result<Tune, TuneError>> for TuneResponse {
    fn from(result: Result<Tune, TuneError>) -> Self {
        match result {
            Ok(tune) => TuneResponse::Success(tune),
            Err(e) => TuneResponse::Failure {
                error: e.to_string(),
            },
        }
    }
}

/// Bundle header metadata with the emitted notes.
pub fn assemble(metadata: TuneMetadata, notes: Vec<NoteEvent>) -> Tune {
    Tune { metadata, notes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::TimeSignature;
    use serde_json::json;

    fn metadata() -> TuneMetadata {
        TuneMetadata {
            title: "Test".to_string(),
            has_title: true,
            time_signature: TimeSignature { beats: 6, beat_type: 8 },
            key_signature: "D".to_string(),
            tempo: 120,
            default_length: Rational64::new(1, 8),
            rhythm: Some("jig".to_string()),
            composer: None,
        }
    }

    #[test]
    fn test_success_shape() {
        let notes = vec![NoteEvent::new(62, Rational64::new(1, 2), Rational64::new(3, 2))];
        let response = TuneResponse::from(Ok(assemble(metadata(), notes)));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Test",
                "timeSignature": [6, 8],
                "keySignature": "D",
                "tempo": 120,
                "notes": [{ "note": 62, "startBeat": 0.5, "durationBeats": 1.5 }]
            })
        );
    }

    #[test]
    fn test_failure_shape() {
        let response = TuneResponse::from(Err(TuneError::NoNotes));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({ "error": "No notes: the tune body contains nothing playable" })
        );
    }

    #[test]
    fn test_end_beat() {
        let event = NoteEvent::new(60, Rational64::from_integer(3), Rational64::new(1, 4));
        assert_eq!(event.end_beat(), 3.25);
    }
}
