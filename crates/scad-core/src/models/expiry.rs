//! Expiration date result models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::ocr::TextFragment;

/// Pattern family that produced a raw date-like string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    /// Full date with separators.
    Standard,
    /// Date with a month name.
    Textual,
    /// Packed digit run (6 or 8 digits).
    Sequence,
    /// Month and year only.
    MonthYear,
    /// Full date with a lost separator before the year.
    Fuzzy,
    /// Day and month without a year.
    Partial,
}

impl MatchType {
    /// All match types, most reliable first.
    pub const ALL: [MatchType; 6] = [
        MatchType::Standard,
        MatchType::Textual,
        MatchType::MonthYear,
        MatchType::Sequence,
        MatchType::Fuzzy,
        MatchType::Partial,
    ];

    /// Base confidence weight of the format, in percent.
    pub fn base_weight_percent(&self) -> u8 {
        match self {
            MatchType::Standard => 95,
            MatchType::Textual => 90,
            MatchType::MonthYear => 80,
            MatchType::Sequence => 75,
            MatchType::Fuzzy => 70,
            MatchType::Partial => 60,
        }
    }

    /// Base confidence weight of the format.
    pub fn base_weight(&self) -> f32 {
        f32::from(self.base_weight_percent()) / 100.0
    }

    /// Name as used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Standard => "standard",
            MatchType::Textual => "textual",
            MatchType::Sequence => "sequence",
            MatchType::MonthYear => "monthYear",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Partial => "partial",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized and scored expiration date candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCandidate {
    /// Calendar date.
    pub date: NaiveDate,

    /// Date formatted as `yyyy-MM-dd`.
    pub formatted_date: String,

    /// Pattern family that produced the candidate.
    pub match_type: MatchType,

    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,

    /// Fragment the date was read from.
    pub source_fragment: TextFragment,

    /// Distance to the anchor the fragment was linked to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_distance: Option<f32>,
}

/// Result handed to the UI.
///
/// `success == false` always carries an `error`; the caller falls back to
/// manual date entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// All fragment texts joined with spaces.
    pub raw_text: String,
}

impl ExtractionOutcome {
    /// Build an outcome from the result of an extraction call.
    pub fn from_result(
        result: std::result::Result<DateCandidate, ExtractionError>,
        raw_text: impl Into<String>,
    ) -> Self {
        match result {
            Ok(candidate) => Self::found(&candidate, raw_text),
            Err(error) => Self::not_found(&error, raw_text),
        }
    }

    /// Outcome for a selected candidate.
    pub fn found(candidate: &DateCandidate, raw_text: impl Into<String>) -> Self {
        Self {
            success: true,
            extracted_date: Some(candidate.formatted_date.clone()),
            confidence: Some(candidate.confidence),
            match_type: Some(candidate.match_type),
            error: None,
            raw_text: raw_text.into(),
        }
    }

    /// Outcome when no date could be extracted.
    pub fn not_found(error: &ExtractionError, raw_text: impl Into<String>) -> Self {
        Self {
            success: false,
            extracted_date: None,
            confidence: None,
            match_type: None,
            error: Some(error.to_string()),
            raw_text: raw_text.into(),
        }
    }

    /// Whether the UI should ask the user to confirm the date.
    pub fn needs_confirmation(&self, min_confidence: f32) -> bool {
        self.confidence.map_or(true, |c| c < min_confidence)
    }
}
