//! # Song Conversion
//!
//! Converts a parsed [`Tune`] into the app's Song JSON: metadata, practice sections,
//! playback settings and scoring thresholds.
//!
//! ## Sections
//! Notes are grouped into sections of `bars-per-section` bars. A new section starts at
//! the first note whose start reaches the current section's end; the last section ends
//! where its last note stops sounding.
//!
//! ## Estimates
//! - Difficulty: note density (notes per beat) scaled by tempo / 120, bucketed 1-5
//! - Duration: seconds of playback at the tune's tempo, at least 10

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::header::TimeSignature;
use crate::tune::{NoteEvent, Tune};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub metadata: SongMetadata,
    pub sections: Vec<Section>,
    pub settings: SongSettings,
    pub scoring: SongScoring,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongMetadata {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub difficulty: u8,
    pub duration_seconds: u32,
    pub attribution: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub label: String,
    pub start_beat: f64,
    pub end_beat: f64,
    pub difficulty: u8,
    pub layers: Layers,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layers {
    pub melody: Vec<NoteEvent>,
    pub full: Vec<NoteEvent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSettings {
    pub tempo: u16,
    pub time_signature: TimeSignature,
    pub key_signature: String,
    pub count_in: u32,
    pub metronome_enabled: bool,
    pub loop_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongScoring {
    pub timing_tolerance_ms: u32,
    pub timing_grace_period_ms: u32,
    pub passing_score: u32,
    pub star_thresholds: [u32; 3],
}

/// Song id for a source file: `abc-` plus the lowercased stem with spaces and
/// underscores turned into dashes.
pub fn song_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    format!("abc-{}", stem.replace([' ', '_'], "-"))
}

/// Readable title from a song id: `abc-the-silver-spear-2` becomes `The Silver Spear 2`.
pub fn title_from_id(song_id: &str) -> String {
    let slug = song_id.strip_prefix("abc-").unwrap_or(song_id);
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn last_end(notes: &[NoteEvent]) -> Option<f64> {
    notes.iter().map(NoteEvent::end_beat).reduce(f64::max)
}

/// Split notes (already in start order) into sections of `bars_per_section` bars.
///
/// A `bars_per_section` of 0 is treated as 1.
pub fn split_into_sections(
    notes: &[NoteEvent],
    beats_per_bar: u32,
    bars_per_section: u32,
    difficulty: u8,
) -> Vec<Section> {
    let beats_per_section = f64::from(beats_per_bar) * f64::from(bars_per_section.max(1));
    let mut sections = Vec::new();
    let mut current: Vec<NoteEvent> = Vec::new();
    let mut section_start = 0.0;

    let make_section = |index: usize, start: f64, end: f64, notes: Vec<NoteEvent>| Section {
        id: format!("section-{}", index),
        label: format!("Section {}", index + 1),
        start_beat: start,
        end_beat: end,
        difficulty,
        layers: Layers {
            melody: notes.clone(),
            full: notes,
        },
    };

    for note in notes {
        if note.start_beat() >= section_start + beats_per_section && !current.is_empty() {
            let index = sections.len();
            sections.push(make_section(
                index,
                section_start,
                section_start + beats_per_section,
                std::mem::take(&mut current),
            ));
            section_start += beats_per_section;
        }
        current.push(note.clone());
    }

    if let Some(end) = last_end(&current) {
        let index = sections.len();
        sections.push(make_section(index, section_start, end, current));
    }

    sections
}

/// Difficulty 1-5 from note density and tempo.
pub fn estimate_difficulty(notes: &[NoteEvent], tempo: u16) -> u8 {
    let Some(last) = last_end(notes) else {
        return 1;
    };
    let density = notes.len() as f64 / last.max(1.0);
    let score = density * (f64::from(tempo) / 120.0);
    match score {
        s if s < 0.5 => 1,
        s if s < 1.0 => 2,
        s if s < 2.0 => 3,
        s if s < 3.0 => 4,
        _ => 5,
    }
}

/// Playback length in whole seconds, never below 10. 60 for an empty list.
pub fn estimate_duration(notes: &[NoteEvent], tempo: u16) -> u32 {
    match last_end(notes) {
        Some(last) => ((last / f64::from(tempo) * 60.0) as u32).max(10),
        None => 60,
    }
}

/// Convert a parsed tune into a Song.
///
/// The title falls back to one derived from `song_id` when the tune has no `T:`,
/// and the artist is the `C:` composer when present.
///
/// # Errors
/// [`ImportError::TooFewNotes`] when the tune has fewer than `config.min_notes` notes.
pub fn convert_tune(tune: &Tune, song_id: &str, config: &ImportConfig) -> Result<Song, ImportError> {
    if tune.notes.len() < config.min_notes {
        return Err(ImportError::TooFewNotes {
            found: tune.notes.len(),
            minimum: config.min_notes,
        });
    }

    let metadata = &tune.metadata;
    let mut notes = tune.notes.clone();
    notes.sort_by(|a, b| {
        a.start_beat()
            .total_cmp(&b.start_beat())
            .then(a.note().cmp(&b.note()))
    });

    let difficulty = estimate_difficulty(&notes, metadata.tempo).clamp(1, 5);
    let sections = split_into_sections(
        &notes,
        u32::from(metadata.time_signature.beats),
        config.bars_per_section,
        config.section_difficulty,
    );

    let genre = metadata
        .rhythm
        .as_ref()
        .map(|r| r.to_lowercase())
        .unwrap_or_else(|| config.genre.clone());
    let title = if metadata.has_title {
        metadata.title.clone()
    } else {
        title_from_id(song_id)
    };
    let artist = metadata
        .composer
        .clone()
        .unwrap_or_else(|| config.artist.clone());

    Ok(Song {
        id: song_id.to_string(),
        version: 1,
        kind: "song".to_string(),
        source: config.source.clone(),
        metadata: SongMetadata {
            title,
            artist,
            genre,
            difficulty,
            duration_seconds: estimate_duration(&notes, metadata.tempo),
            attribution: config.attribution.clone(),
        },
        sections,
        settings: SongSettings {
            tempo: metadata.tempo,
            time_signature: metadata.time_signature,
            key_signature: metadata.key_signature.clone(),
            count_in: config.count_in,
            metronome_enabled: config.metronome_enabled,
            loop_enabled: config.loop_enabled,
        },
        scoring: SongScoring {
            timing_tolerance_ms: config.scoring.timing_tolerance_ms,
            timing_grace_period_ms: config.scoring.timing_grace_period_ms,
            passing_score: config.scoring.passing_score,
            star_thresholds: config.scoring.star_thresholds,
        },
    })
}
