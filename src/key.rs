//! # Key Signature Resolution
//!
//! Turns a `K:` header value into the standing accidentals every unmarked note inherits.
//!
//! Keys are placed on the circle of fifths (`fifths`: positive = sharps, negative = flats).
//! Sharps are added in the order F C G D A E B, flats in the order B E A D G C F.
//!
//! Recognized key strings are a tonic (`A`-`G`, optional `#` or `b`) followed by a major
//! suffix (none, `maj`, `major`, `ion`) or a minor suffix (`m`, `min`, `minor`, `aeo`).
//! Anything else resolves to C major with a warning instead of failing the import.

use log::warn;

/// Diatonic letter indices in the order sharps are added: F C G D A E B
const SHARP_ORDER: [usize; 7] = [3, 0, 4, 1, 5, 2, 6];

/// Diatonic letter indices in the order flats are added: B E A D G C F
const FLAT_ORDER: [usize; 7] = [6, 2, 5, 1, 4, 0, 3];

/// Mode for key signature
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

/// Key signature (number of sharps/flats)
/// Positive = sharps, Negative = flats, Zero = C major / A minor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeySignature {
    pub fifths: i8, // -7 to +7 (flats to sharps)
    pub mode: Mode,
}

impl KeySignature {
    /// Parse a key string like "G", "Bb", "F#m", "Dmaj", "Amin".
    ///
    /// Returns `None` for modes outside the fixed table (e.g. "Ador", "Dmix") and for
    /// keys beyond seven sharps or flats.
    pub fn from_str(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        // Position of the natural tonic on the circle of fifths
        let natural: i8 = match chars.next()?.to_ascii_uppercase() {
            'F' => -1,
            'C' => 0,
            'G' => 1,
            'D' => 2,
            'A' => 3,
            'E' => 4,
            'B' => 5,
            _ => return None,
        };

        let rest = chars.as_str();
        let (shift, suffix) = if let Some(r) = rest.strip_prefix('#') {
            (7, r)
        } else if let Some(r) = rest.strip_prefix('b') {
            (-7, r)
        } else {
            (0, rest)
        };

        let mode = match suffix.trim().to_ascii_lowercase().as_str() {
            "" | "maj" | "major" | "ion" | "ionian" => Mode::Major,
            "m" | "min" | "minor" | "aeo" | "aeolian" => Mode::Minor,
            _ => return None,
        };

        // A minor key shares its signature with the major key three fifths above
        let fifths = match mode {
            Mode::Major => natural + shift,
            Mode::Minor => natural + shift - 3,
        };
        if !(-7..=7).contains(&fifths) {
            return None;
        }

        Some(Self { fifths, mode })
    }

    /// Standing accidentals implied by this signature.
    pub fn accidentals(&self) -> KeyAccidentals {
        let mut offsets = [0i8; 7];
        let count = self.fifths.unsigned_abs() as usize;
        if self.fifths > 0 {
            for &letter in &SHARP_ORDER[..count] {
                offsets[letter] = 1;
            }
        } else {
            for &letter in &FLAT_ORDER[..count] {
                offsets[letter] = -1;
            }
        }
        KeyAccidentals { offsets }
    }
}

/// Semitone offset per diatonic letter (C=0 ... B=6) for the active key.
///
/// Built once per parse and shared read-only by the note resolver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeyAccidentals {
    offsets: [i8; 7],
}

impl KeyAccidentals {
    /// Offset for a diatonic letter index. Indices outside 0-6 wrap.
    pub fn offset(&self, letter: usize) -> i8 {
        self.offsets[letter % 7]
    }
}

/// Resolve a `K:` value, falling back to C major for keys outside the table.
pub fn resolve_key(key: &str) -> KeyAccidentals {
    match KeySignature::from_str(key) {
        Some(signature) => signature.accidentals(),
        None => {
            warn!("Unrecognized key '{}', using C major", key);
            KeyAccidentals::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_has_no_accidentals() {
        let key = resolve_key("C");
        for letter in 0..7 {
            assert_eq!(key.offset(letter), 0);
        }
    }

    #[test]
    fn test_g_major_sharpens_f() {
        let key = resolve_key("G");
        assert_eq!(key.offset(3), 1); // F
        assert_eq!(key.offset(0), 0); // C
    }

    #[test]
    fn test_d_major() {
        let sig = KeySignature::from_str("D").unwrap();
        assert_eq!(sig.fifths, 2);
        let key = sig.accidentals();
        assert_eq!(key.offset(3), 1); // F#
        assert_eq!(key.offset(0), 1); // C#
        assert_eq!(key.offset(4), 0); // G
    }

    #[test]
    fn test_flat_keys() {
        let key = resolve_key("Bb");
        assert_eq!(key.offset(6), -1); // Bb
        assert_eq!(key.offset(2), -1); // Eb
        assert_eq!(key.offset(5), 0); // A

        let key = resolve_key("F");
        assert_eq!(key.offset(6), -1);
        assert_eq!(key.offset(2), 0);
    }

    #[test]
    fn test_seven_sharps_and_flats() {
        let sharps = resolve_key("C#");
        let flats = resolve_key("Cb");
        for letter in 0..7 {
            assert_eq!(sharps.offset(letter), 1);
            assert_eq!(flats.offset(letter), -1);
        }
    }

    #[test]
    fn test_minor_keys_use_relative_major() {
        assert_eq!(KeySignature::from_str("Am").unwrap().fifths, 0);
        assert_eq!(KeySignature::from_str("Em").unwrap().fifths, 1);
        assert_eq!(KeySignature::from_str("Bmin").unwrap().fifths, 2);
        assert_eq!(KeySignature::from_str("Dm").unwrap().fifths, -1);
        assert_eq!(KeySignature::from_str("F#m").unwrap().mode, Mode::Minor);
    }

    #[test]
    fn test_major_suffixes() {
        assert_eq!(KeySignature::from_str("Dmaj").unwrap().fifths, 2);
        assert_eq!(KeySignature::from_str("G major").unwrap().fifths, 1);
        assert_eq!(KeySignature::from_str(" A ").unwrap().fifths, 3);
    }

    #[test]
    fn test_unrecognized_keys_fall_back_to_c() {
        assert!(KeySignature::from_str("Ador").is_none());
        assert!(KeySignature::from_str("H").is_none());
        assert!(KeySignature::from_str("").is_none());
        assert!(KeySignature::from_str("Fb").is_none()); // 8 flats
        assert_eq!(resolve_key("Dmix"), KeyAccidentals::default());
    }
}
