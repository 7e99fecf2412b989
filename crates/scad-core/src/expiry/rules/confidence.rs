//! Confidence scoring for date candidates.

use crate::models::MatchType;

/// Bonus for a fragment linked to an expiration anchor.
pub const KEYWORD_BONUS: f64 = 0.05;

/// Penalty factor for dates whose year or day was inferred.
pub const RECONSTRUCTION_FACTOR: f64 = 0.9;

/// Penalty factor when rejected matches outnumber valid ones more than two to one.
pub const NOISE_FACTOR: f64 = 0.85;

/// Bonus when exactly one valid match was found.
pub const UNAMBIGUOUS_BONUS: f64 = 0.03;

/// Inputs to [`calculate_confidence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceFactors {
    pub match_type: MatchType,
    pub has_keyword_context: bool,
    pub was_reconstructed: bool,
    pub valid_dates_count: usize,
    pub rejected_dates_count: usize,
}

impl ConfidenceFactors {
    pub fn new(match_type: MatchType) -> Self {
        Self {
            match_type,
            has_keyword_context: false,
            was_reconstructed: false,
            valid_dates_count: 1,
            rejected_dates_count: 0,
        }
    }

    pub fn score(&self) -> f32 {
        calculate_confidence(self)
    }
}

/// Score a candidate in `[0, 1]`, rounded to two decimals.
///
/// Adjustments apply in a fixed order: base weight, keyword bonus (capped at
/// 1), reconstruction penalty, noise penalty, unambiguous bonus (capped at 1).
pub fn calculate_confidence(factors: &ConfidenceFactors) -> f32 {
    let mut confidence = f64::from(factors.match_type.base_weight_percent()) / 100.0;

    if factors.has_keyword_context {
        confidence = (confidence + KEYWORD_BONUS).min(1.0);
    }

    if factors.was_reconstructed {
        confidence *= RECONSTRUCTION_FACTOR;
    }

    if factors.rejected_dates_count > factors.valid_dates_count * 2 {
        confidence *= NOISE_FACTOR;
    }

    if factors.valid_dates_count == 1 {
        confidence = (confidence + UNAMBIGUOUS_BONUS).min(1.0);
    }

    ((confidence * 100.0).round() / 100.0) as f32
}
