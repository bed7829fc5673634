//! # Note Resolution
//!
//! Turns a single [`NoteToken`] into an absolute pitch and a length in beats.
//!
//! ## Pitch
//! Notes are first placed on a diatonic scale where 7 consecutive integers span one
//! octave: `C`=0 ... `B`=6, lowercase letters one octave higher (+7), each `'` +7 and
//! each `,` -7. The diatonic number `p` becomes an absolute pitch with
//!
//! ```text
//! 60 + 12 * floor(p / 7) + [0, 2, 4, 5, 7, 9, 11][p mod 7]
//! ```
//!
//! and then gets a semitone offset chosen in this order:
//! 1. an explicit sharp/flat on the token
//! 2. an explicit natural on the token (forces 0)
//! 3. an accidental written earlier in the same bar, same letter and octave
//! 4. the key signature
//!
//! ## Duration
//! `default_length * multiplier / divisor` is a fraction of a whole note; beats are
//! always quarter notes, so the result is multiplied by 4.

use crate::key::KeyAccidentals;
use crate::lexer::{DurationSuffix, NoteToken};
use num_rational::Rational64;
use std::collections::HashMap;

/// Pitch of diatonic number 0 (middle C)
pub const MIDDLE_C: i32 = 60;

/// Semitones above C for each diatonic letter C D E F G A B
const DIATONIC_SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Diatonic letter index (C=0 ... B=6), ignoring case
pub fn letter_index(letter: char) -> Option<i32> {
    match letter.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(1),
        'E' => Some(2),
        'F' => Some(3),
        'G' => Some(4),
        'A' => Some(5),
        'B' => Some(6),
        _ => None,
    }
}

/// Absolute pitch of a diatonic number, without any accidental
pub fn diatonic_to_midi(p: i32) -> i32 {
    let octave = p.div_euclid(7);
    MIDDLE_C + 12 * octave + DIATONIC_SEMITONES[p.rem_euclid(7) as usize]
}

/// Accidentals written earlier in the current bar, keyed by (letter, octave).
#[derive(Debug, Default)]
pub struct BarAccidentals {
    overrides: HashMap<(i32, i32), i8>,
}

impl BarAccidentals {
    pub fn get(&self, letter: i32, octave: i32) -> Option<i8> {
        self.overrides.get(&(letter, octave)).copied()
    }

    pub fn set(&mut self, letter: i32, octave: i32, offset: i8) {
        self.overrides.insert((letter, octave), offset);
    }

    pub fn clear(&mut self) {
        self.overrides.clear();
    }
}

/// Resolves note tokens against the key and default note length of one tune.
pub struct NoteResolver<'a> {
    key: &'a KeyAccidentals,
    default_length: Rational64,
}

impl<'a> NoteResolver<'a> {
    pub fn new(key: &'a KeyAccidentals, default_length: Rational64) -> Self {
        Self {
            key,
            default_length,
        }
    }

    /// Absolute pitch of `note`. Explicit accidentals are recorded into `bar`.
    ///
    /// The result is not range-checked; callers decide what is playable.
    pub fn pitch(&self, note: &NoteToken, bar: &mut BarAccidentals) -> i32 {
        // The lexer only produces A-G / a-g
        let index = letter_index(note.letter).unwrap_or(0);
        let mut p = index + 7 * note.octave_marks;
        if note.letter.is_ascii_lowercase() {
            p += 7;
        }

        let octave = p.div_euclid(7);
        let offset = match note.accidental {
            Some(accidental) => {
                let offset = accidental.offset();
                bar.set(index, octave, offset);
                offset
            }
            None => bar
                .get(index, octave)
                .unwrap_or_else(|| self.key.offset(index as usize)),
        };

        diatonic_to_midi(p) + i32::from(offset)
    }

    /// Length in beats (quarter notes) for an optional duration suffix.
    pub fn duration_beats(&self, suffix: Option<&DurationSuffix>) -> Rational64 {
        let (multiplier, divisor) = match suffix {
            Some(s) => (s.multiplier.unwrap_or(1), s.divisor.unwrap_or(1)),
            None => (1, 1),
        };
        self.default_length * Rational64::new(i64::from(multiplier), i64::from(divisor)) * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::resolve_key;
    use crate::lexer::Accidental;

    fn token(accidental: Option<Accidental>, letter: char, octave_marks: i32) -> NoteToken {
        NoteToken {
            accidental,
            letter,
            octave_marks,
            duration: None,
        }
    }

    #[test]
    fn test_diatonic_formula() {
        assert_eq!(diatonic_to_midi(0), 60);
        assert_eq!(diatonic_to_midi(1), 62);
        assert_eq!(diatonic_to_midi(6), 71);
        assert_eq!(diatonic_to_midi(7), 72);
        assert_eq!(diatonic_to_midi(-7), 48);
        assert_eq!(diatonic_to_midi(-1), 59); // B below middle C
    }

    #[test]
    fn test_letter_case_and_octave_marks() {
        let key = resolve_key("C");
        let resolver = NoteResolver::new(&key, Rational64::new(1, 8));
        let mut bar = BarAccidentals::default();

        assert_eq!(resolver.pitch(&token(None, 'C', 0), &mut bar), 60);
        assert_eq!(resolver.pitch(&token(None, 'c', 0), &mut bar), 72);
        assert_eq!(resolver.pitch(&token(None, 'c', 1), &mut bar), 84);
        assert_eq!(resolver.pitch(&token(None, 'C', -1), &mut bar), 48);
        assert_eq!(resolver.pitch(&token(None, 'B', -1), &mut bar), 59);
        assert_eq!(resolver.pitch(&token(None, 'a', 0), &mut bar), 81);
    }

    #[test]
    fn test_key_signature_applies() {
        let key = resolve_key("G");
        let resolver = NoteResolver::new(&key, Rational64::new(1, 8));
        let mut bar = BarAccidentals::default();

        assert_eq!(resolver.pitch(&token(None, 'F', 0), &mut bar), 66);
        assert_eq!(resolver.pitch(&token(None, 'f', 0), &mut bar), 78);
    }

    #[test]
    fn test_explicit_accidental_overrides_key() {
        let key = resolve_key("G");
        let resolver = NoteResolver::new(&key, Rational64::new(1, 8));
        let mut bar = BarAccidentals::default();

        assert_eq!(resolver.pitch(&token(Some(Accidental::Flat), 'F', 0), &mut bar), 64);
        assert_eq!(resolver.pitch(&token(Some(Accidental::Natural), 'F', 0), &mut bar), 65);
    }

    #[test]
    fn test_bar_override_carries_within_octave() {
        let key = resolve_key("C");
        let resolver = NoteResolver::new(&key, Rational64::new(1, 8));
        let mut bar = BarAccidentals::default();

        assert_eq!(resolver.pitch(&token(Some(Accidental::Sharp), 'C', 0), &mut bar), 61);
        assert_eq!(resolver.pitch(&token(None, 'C', 0), &mut bar), 61);
        // Other octave is unaffected
        assert_eq!(resolver.pitch(&token(None, 'c', 0), &mut bar), 72);

        bar.clear();
        assert_eq!(resolver.pitch(&token(None, 'C', 0), &mut bar), 60);
    }

    #[test]
    fn test_explicit_accidental_replaces_opposite_bar_override() {
        let key = resolve_key("C");
        let resolver = NoteResolver::new(&key, Rational64::new(1, 8));
        let mut bar = BarAccidentals::default();

        assert_eq!(resolver.pitch(&token(Some(Accidental::Flat), 'C', 0), &mut bar), 59);
        assert_eq!(resolver.pitch(&token(Some(Accidental::Sharp), 'C', 0), &mut bar), 61);
        assert_eq!(resolver.pitch(&token(None, 'C', 0), &mut bar), 61);
    }

    #[test]
    fn test_natural_overrides_bar_and_key() {
        let key = resolve_key("D");
        let resolver = NoteResolver::new(&key, Rational64::new(1, 8));
        let mut bar = BarAccidentals::default();

        assert_eq!(resolver.pitch(&token(Some(Accidental::Flat), 'F', 0), &mut bar), 64);
        assert_eq!(resolver.pitch(&token(Some(Accidental::Natural), 'F', 0), &mut bar), 65);
        // The natural is now the bar override and beats the key's F#
        assert_eq!(resolver.pitch(&token(None, 'F', 0), &mut bar), 65);
    }

    #[test]
    fn test_duration_formula() {
        let key = KeyAccidentals::default();
        let resolver = NoteResolver::new(&key, Rational64::new(1, 4));
        let two = DurationSuffix { multiplier: Some(2), divisor: None };
        let half = DurationSuffix { multiplier: None, divisor: Some(2) };
        let three_halves = DurationSuffix { multiplier: Some(3), divisor: Some(2) };

        assert_eq!(resolver.duration_beats(None), Rational64::from_integer(1));
        assert_eq!(resolver.duration_beats(Some(&two)), Rational64::from_integer(2));
        assert_eq!(resolver.duration_beats(Some(&half)), Rational64::new(1, 2));
        assert_eq!(resolver.duration_beats(Some(&three_halves)), Rational64::new(3, 2));
    }

    #[test]
    fn test_eighth_note_default_length() {
        let key = KeyAccidentals::default();
        let resolver = NoteResolver::new(&key, Rational64::new(1, 8));
        assert_eq!(resolver.duration_beats(None), Rational64::new(1, 2));
    }
}
