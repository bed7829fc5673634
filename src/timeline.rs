//! # Timeline Builder
//!
//! Drives the token stream through the [`NoteResolver`] and emits [`NoteEvent`]s in
//! start order.
//!
//! ## State
//! - `current_beat`: where the next note starts
//! - `bar_accidentals`: accidentals written so far in this bar
//! - `pending`: the most recent single note, held back until we know whether a tie
//!   extends it. Emitted notes are only ever appended, never edited.
//! - `chord`: pitches collected between `[` and `]`
//!
//! ## Transitions
//! | Token          | Effect                                                          |
//! |----------------|-----------------------------------------------------------------|
//! | `BarSeparator` | clear bar accidentals                                           |
//! | `ChordOpen`    | flush pending, start collecting pitches                        |
//! | `Note` (chord) | resolve pitch only                                              |
//! | `ChordClose`   | emit every pitch at `current_beat`, advance once               |
//! | `Note`         | extend a tied pending note of the same pitch, or start a new one |
//! | `TieMarker`    | arm the tie if it directly follows a note, else ignore         |
//! | `Rest`         | flush pending, advance                                          |

use crate::error::TuneError;
use crate::key::KeyAccidentals;
use crate::lexer::{LocatedToken, Token};
use crate::resolver::{BarAccidentals, NoteResolver};
use crate::tune::NoteEvent;
use log::debug;
use num_rational::Rational64;

/// A single note whose length may still grow through a tie
#[derive(Debug, Clone, Copy)]
struct PendingNote {
    pitch: u8,
    start: Rational64,
    duration: Rational64,
}

pub struct Timeline<'a> {
    resolver: NoteResolver<'a>,
    current_beat: Rational64,
    bar_accidentals: BarAccidentals,
    events: Vec<NoteEvent>,
    pending: Option<PendingNote>,
    tie_open: bool,
    after_note: bool,
    chord: Option<Vec<u8>>,
}

impl<'a> Timeline<'a> {
    pub fn new(key: &'a KeyAccidentals, default_length: Rational64) -> Self {
        Self {
            resolver: NoteResolver::new(key, default_length),
            current_beat: Rational64::from_integer(0),
            bar_accidentals: BarAccidentals::default(),
            events: Vec::new(),
            pending: None,
            tie_open: false,
            after_note: false,
            chord: None,
        }
    }

    /// Consume every token and return the finished note list.
    ///
    /// # Errors
    /// - [`TuneError::Syntax`] for a pitch outside 0-127 or misplaced chord tokens
    /// - [`TuneError::NoNotes`] when nothing playable was produced
    pub fn run(mut self, tokens: &[LocatedToken]) -> Result<Vec<NoteEvent>, TuneError> {
        for token in tokens {
            self.step(token)?;
        }
        self.finish()
    }

    fn step(&mut self, located: &LocatedToken) -> Result<(), TuneError> {
        let after_note = std::mem::take(&mut self.after_note);

        match &located.token {
            Token::BarSeparator => {
                self.bar_accidentals.clear();
            }
            Token::ChordOpen => {
                if self.chord.is_some() {
                    return Err(syntax(located, "Nested chord"));
                }
                self.flush_pending();
                self.chord = Some(Vec::new());
            }
            Token::ChordClose(suffix) => {
                let pitches = self
                    .chord
                    .take()
                    .ok_or_else(|| syntax(located, "Unmatched ']'"))?;
                let duration = self.resolver.duration_beats(suffix.as_ref());
                for pitch in pitches {
                    self.events
                        .push(NoteEvent::new(pitch, self.current_beat, duration));
                }
                self.current_beat += duration;
            }
            Token::Note(note) => {
                let pitch = self.resolver.pitch(note, &mut self.bar_accidentals);
                let pitch = u8::try_from(pitch)
                    .ok()
                    .filter(|p| *p <= 127)
                    .ok_or_else(|| syntax(located, format!("Pitch {} is out of range", pitch)))?;

                if let Some(pitches) = self.chord.as_mut() {
                    // Inner lengths are ignored, the closing bracket sets the length
                    pitches.push(pitch);
                    return Ok(());
                }

                let duration = self.resolver.duration_beats(note.duration.as_ref());
                match self.pending.as_mut() {
                    Some(pending) if self.tie_open && pending.pitch == pitch => {
                        pending.duration += duration;
                    }
                    _ => {
                        self.flush_pending();
                        self.pending = Some(PendingNote {
                            pitch,
                            start: self.current_beat,
                            duration,
                        });
                    }
                }
                self.current_beat += duration;
                self.tie_open = false;
                self.after_note = true;
            }
            Token::TieMarker => {
                if after_note {
                    self.tie_open = true;
                } else {
                    debug!(
                        "Ignoring tie at line {}, column {} that does not follow a note",
                        located.line, located.column
                    );
                }
            }
            Token::Rest(suffix) => {
                if self.chord.is_some() {
                    return Err(syntax(located, "Rest inside a chord"));
                }
                self.flush_pending();
                self.tie_open = false;
                self.current_beat += self.resolver.duration_beats(suffix.as_ref());
            }
        }

        Ok(())
    }

    fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.events
                .push(NoteEvent::new(pending.pitch, pending.start, pending.duration));
        }
        self.tie_open = false;
    }

    fn finish(mut self) -> Result<Vec<NoteEvent>, TuneError> {
        self.flush_pending();
        if self.events.is_empty() {
            return Err(TuneError::NoNotes);
        }
        Ok(self.events)
    }
}

fn syntax(located: &LocatedToken, message: impl Into<String>) -> TuneError {
    TuneError::Syntax {
        line: located.line,
        column: located.column,
        message: message.into(),
    }
}
