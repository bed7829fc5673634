//! Batch conversion of `.abc` files into Song JSON files.
//!
//! A tune that fails to parse or convert is logged and skipped; only failures to
//! write output abort the run.

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::parse_tune;
use crate::song::{convert_tune, song_id_from_path, Song};
use crate::tunebook::split_tunebook;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Totals for one import run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImportSummary {
    pub converted: usize,
    pub total: usize,
}

impl std::ops::AddAssign for ImportSummary {
    fn add_assign(&mut self, other: Self) {
        self.converted += other.converted;
        self.total += other.total;
    }
}

/// All `.abc` files under `dir`, sorted by path.
pub fn collect_abc_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "abc"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Parse and convert every tune in one tunebook text.
///
/// The first tune gets `base_id`, later ones `base_id-2`, `base_id-3`, ...
/// Failed tunes are returned as errors alongside their id.
pub fn convert_tunebook(
    text: &str,
    base_id: &str,
    config: &ImportConfig,
) -> Vec<(String, Result<Song, ImportError>)> {
    split_tunebook(text)
        .into_iter()
        .enumerate()
        .map(|(i, tune_text)| {
            let id = if i == 0 {
                base_id.to_string()
            } else {
                format!("{}-{}", base_id, i + 1)
            };
            let result = parse_tune(tune_text)
                .map_err(ImportError::from)
                .and_then(|tune| convert_tune(&tune, &id, config));
            (id, result)
        })
        .collect()
}

fn write_song(song: &Song, output_dir: &Path) -> Result<PathBuf, ImportError> {
    let out_path = output_dir.join(format!("{}.json", song.id));
    let json = serde_json::to_string_pretty(song)?;
    fs::write(&out_path, json).map_err(|source| ImportError::Io {
        path: out_path.display().to_string(),
        source,
    })?;
    Ok(out_path)
}

/// Convert one `.abc` file, writing each song into `output_dir`.
///
/// An unreadable file counts as one unconverted tune.
pub fn import_file(
    path: &Path,
    output_dir: &Path,
    config: &ImportConfig,
) -> Result<ImportSummary, ImportError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            return Ok(ImportSummary {
                converted: 0,
                total: 1,
            });
        }
    };

    let mut summary = ImportSummary::default();
    for (id, result) in convert_tunebook(&text, &song_id_from_path(path), config) {
        summary.total += 1;
        match result {
            Ok(song) => {
                let out_path = write_song(&song, output_dir)?;
                info!("  {} -> {}", id, out_path.display());
                summary.converted += 1;
            }
            Err(e) => warn!("  Skipping {} in {}: {}", id, path.display(), e),
        }
    }
    Ok(summary)
}

/// Convert every file in `files`, creating `output_dir` if needed.
pub fn import_files(
    files: &[PathBuf],
    output_dir: &Path,
    config: &ImportConfig,
) -> Result<ImportSummary, ImportError> {
    fs::create_dir_all(output_dir).map_err(|source| ImportError::Io {
        path: output_dir.display().to_string(),
        source,
    })?;

    info!("Found {} ABC files to process", files.len());

    let mut summary = ImportSummary::default();
    for path in files {
        info!("Processing: {}", path.display());
        summary += import_file(path, output_dir, config)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_tunebook_ids_and_failures() {
        let book = "X:1\nT:Good\nK:D\nDEFG|ABcd|\n\nX:2\nT:Bad\nM:4/4\n\nX:3\nT:Also Good\nK:G\nGABc|defg|\n";
        let results = convert_tunebook(book, "abc-book", &ImportConfig::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "abc-book");
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, "abc-book-2");
        assert!(matches!(
            results[1].1,
            Err(ImportError::Tune(crate::TuneError::MissingKey))
        ));
        assert_eq!(results[2].0, "abc-book-3");
        assert!(results[2].1.is_ok());
    }
}
