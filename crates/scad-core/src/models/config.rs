//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScadError};

/// Main configuration for the scad pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScadConfig {
    /// Date extraction configuration.
    pub extraction: ExtractionConfig,

    /// Spatial relation configuration.
    pub geometry: GeometryConfig,

    /// Keyword and month dictionaries.
    pub dictionaries: DictionaryConfig,
}

/// Date plausibility and acceptance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Earliest accepted calendar year.
    pub min_year: i32,

    /// Latest accepted year, as an offset from the reference year.
    pub max_year_offset: i32,

    /// Candidates older than this many years before the reference date are
    /// discarded as implausible.
    pub past_tolerance_years: u32,

    /// Confidence below which the UI should ask for confirmation.
    /// Not used by the engine itself.
    pub min_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_year: 2020,
            max_year_offset: 20,
            past_tolerance_years: 1,
            min_confidence: 0.9,
        }
    }
}

/// Tolerances used to relate a date fragment to an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Allowed vertical center offset for right-of, as a share of the average height.
    pub right_of_tolerance: f32,

    /// Required horizontal overlap for below, as a share of the narrower width.
    pub below_tolerance: f32,

    /// Required horizontal overlap for above, as a share of the narrower width.
    pub above_tolerance: f32,

    /// Maximum distance between an anchor and a linked fragment (frame units).
    pub max_link_distance: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            right_of_tolerance: 0.5,
            below_tolerance: 0.8,
            above_tolerance: 0.8,
            max_link_distance: 200.0,
        }
    }
}

/// Locale dictionaries. New languages are added here, not in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Keywords that label an expiration date.
    pub anchor_keywords: Vec<String>,

    /// Month tokens mapped to month numbers (1-12).
    pub months: BTreeMap<String, u32>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            anchor_keywords: DEFAULT_ANCHOR_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            months: DEFAULT_MONTHS
                .iter()
                .map(|(name, number)| (name.to_string(), *number))
                .collect(),
        }
    }
}

/// Keywords that usually precede or label an expiration date.
pub const DEFAULT_ANCHOR_KEYWORDS: &[&str] = &[
    "SCAD",
    "SCADENZA",
    "EXP",
    "EXPIRES",
    "EXPIRY",
    "BEST BEFORE",
    "USE BY",
    "BBE",
    "BB",
    "ENTRO",
    "CONSUMARSI",
    "PREFERIBILMENTE",
    "VALIDO",
    "FINO",
    "VAL",
    "DA CONSUMARE",
    "DATA",
    "LOTTO/SCAD",
    "TMC", // Termine Minimo di Conservazione
];

/// Italian and English three-letter month abbreviations.
pub const DEFAULT_MONTHS: &[(&str, u32)] = &[
    ("GEN", 1),
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MAG", 5),
    ("MAY", 5),
    ("GIU", 6),
    ("JUN", 6),
    ("LUG", 7),
    ("JUL", 7),
    ("AGO", 8),
    ("AUG", 8),
    ("SET", 9),
    ("SEP", 9),
    ("OTT", 10),
    ("OCT", 10),
    ("NOV", 11),
    ("DIC", 12),
    ("DEC", 12),
];

/// Upper bound for the year offsets in [`ExtractionConfig`].
pub const MAX_YEAR_SPAN: i32 = 100;

impl ScadConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScadConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that serde cannot constrain.
    pub fn validate(&self) -> Result<()> {
        if self.dictionaries.months.is_empty() {
            return Err(ScadError::Config("month table must not be empty".to_string()));
        }
        if self.dictionaries.anchor_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ScadError::Config("anchor keyword list must not be empty".to_string()));
        }

        if let Some((name, number)) = self
            .dictionaries
            .months
            .iter()
            .find(|(_, number)| !(1..=12).contains(*number))
        {
            return Err(ScadError::Config(format!(
                "month '{}' maps to {}, expected 1-12",
                name, number
            )));
        }

        let g = &self.geometry;
        let tolerances = [g.right_of_tolerance, g.below_tolerance, g.above_tolerance, g.max_link_distance];
        if tolerances.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ScadError::Config(
                "geometry tolerances must be finite and non-negative".to_string(),
            ));
        }

        let e = &self.extraction;
        if !(0..=MAX_YEAR_SPAN).contains(&e.max_year_offset) {
            return Err(ScadError::Config(format!(
                "max_year_offset must be between 0 and {}",
                MAX_YEAR_SPAN
            )));
        }
        if e.past_tolerance_years > MAX_YEAR_SPAN as u32 {
            return Err(ScadError::Config(format!(
                "past_tolerance_years must be at most {}",
                MAX_YEAR_SPAN
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = ScadConfig::default();
        config.save(&path).unwrap();

        assert_eq!(ScadConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "extraction": { "min_year": 2022 } }"#).unwrap();

        let config = ScadConfig::from_file(&path).unwrap();
        assert_eq!(config.extraction.min_year, 2022);
        assert_eq!(config.extraction.max_year_offset, 20);
        assert_eq!(config.dictionaries.months.get("GEN"), Some(&1));
    }

    #[test]
    fn test_rejects_bad_month_number() {
        let mut config = ScadConfig::default();
        config.dictionaries.months.insert("XYZ".to_string(), 13);

        assert!(matches!(config.validate(), Err(ScadError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_dictionaries() {
        let mut config = ScadConfig::default();
        config.dictionaries.months.clear();
        assert!(matches!(config.validate(), Err(ScadError::Config(_))));

        let mut config = ScadConfig::default();
        config.dictionaries.anchor_keywords = vec!["  ".to_string()];
        assert!(matches!(config.validate(), Err(ScadError::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_year_offsets() {
        let mut config = ScadConfig::default();
        config.extraction.max_year_offset = i32::MAX;
        assert!(matches!(config.validate(), Err(ScadError::Config(_))));

        let mut config = ScadConfig::default();
        config.extraction.past_tolerance_years = u32::MAX;
        assert!(matches!(config.validate(), Err(ScadError::Config(_))));

        let mut config = ScadConfig::default();
        config.extraction.max_year_offset = MAX_YEAR_SPAN;
        config.extraction.past_tolerance_years = MAX_YEAR_SPAN as u32;
        assert!(config.validate().is_ok());
    }
}
