//! Import configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) is valid:
//!
//! ```yaml
//! bars-per-section: 8
//! genre: folk
//! scoring:
//!   passing-score: 60
//! ```

use crate::error::ImportError;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ImportConfig {
    pub bars_per_section: u32,
    /// Tunes with fewer notes are skipped
    pub min_notes: usize,
    pub source: String,
    pub artist: String,
    /// Used when a tune has no `R:` header
    pub genre: String,
    pub attribution: String,
    pub count_in: u32,
    pub metronome_enabled: bool,
    pub loop_enabled: bool,
    pub section_difficulty: u8,
    pub scoring: ScoringConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            bars_per_section: 16,
            min_notes: 4,
            source: "thesession".to_string(),
            artist: "Traditional".to_string(),
            genre: "folk".to_string(),
            attribution: "The Session (thesession.org)".to_string(),
            count_in: 4,
            metronome_enabled: true,
            loop_enabled: true,
            section_difficulty: 3,
            scoring: ScoringConfig::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub timing_tolerance_ms: u32,
    pub timing_grace_period_ms: u32,
    pub passing_score: u32,
    pub star_thresholds: [u32; 3],
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            timing_tolerance_ms: 50,
            timing_grace_period_ms: 150,
            passing_score: 70,
            star_thresholds: [70, 85, 95],
        }
    }
}

impl ImportConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ImportError> {
        // serde_yaml reads an empty document as null rather than an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ImportError> {
        if self.bars_per_section == 0 {
            return Err(ImportError::InvalidSetting {
                field: "bars-per-section",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }
}
