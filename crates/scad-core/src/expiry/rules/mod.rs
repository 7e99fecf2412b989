//! Rule-based building blocks for expiration date extraction.

pub mod confidence;
pub mod matchers;
pub mod normalize;
pub mod patterns;

pub use confidence::{calculate_confidence, ConfidenceFactors};
pub use matchers::{PatternExtractor, PatternFamily};
pub use normalize::{
    expand_two_digit_year, last_day_of_month, DateNormalizer, DateTemplate, NormalizedDate,
    STANDARD_TEMPLATES,
};

use crate::models::MatchType;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Raw date-like text found by a pattern family, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    /// Matched text.
    pub value: String,
    /// Family that produced the match.
    pub match_type: MatchType,
    /// Provisional confidence (the family's base weight).
    pub confidence: f32,
    /// Byte span in the searched text, when it maps back to the fragment.
    pub position: Option<(usize, usize)>,
}

impl DateMatch {
    pub fn new(value: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            value: value.into(),
            match_type,
            confidence: match_type.base_weight(),
            position: None,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
