//! Error types for the scad-core library.

use thiserror::Error;

/// Main error type for the scad library.
#[derive(Error, Debug)]
pub enum ScadError {
    /// Expiration date extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Date normalization error.
    #[error("normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Reasons an extraction call ends without a date.
///
/// All of these are recoverable: callers turn them into a "no date" outcome
/// and fall back to manual entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No pattern family matched any fragment.
    #[error("no date found")]
    NoMatchFound,

    /// Matches were found but every one failed normalization or plausibility.
    #[error("all date candidates rejected")]
    AllCandidatesRejected,

    /// The fragment set could not be used.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The caller abandoned the extraction at a checkpoint.
    #[error("extraction cancelled")]
    Cancelled,
}

/// Failures of a single normalizer.
///
/// These never reach the UI individually; they feed the rejected-candidate
/// count used by the confidence scorer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Invalid input")]
    InvalidInput,

    #[error("Unable to parse date")]
    UnableToParse,

    #[error("Unknown month")]
    UnknownMonth,

    #[error("Invalid day")]
    InvalidDay,

    #[error("Invalid date")]
    InvalidDate,

    #[error("Year too old")]
    YearTooOld,

    #[error("Year too far in future")]
    YearTooFarInFuture,
}

impl NormalizeError {
    /// Whether the failure came from the plausible-year window.
    pub fn is_year_window(&self) -> bool {
        matches!(self, NormalizeError::YearTooOld | NormalizeError::YearTooFarInFuture)
    }
}

/// Result type for the scad library.
pub type Result<T> = std::result::Result<T, ScadError>;
