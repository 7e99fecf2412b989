//! Pattern catalog: ordered families of regexes, each tagged with a match type.

use std::collections::HashSet;

use regex::Regex;

use super::patterns::{
    FUZZY_DATE, MONTH_YEAR, MONTH_YEAR_SPACED, PARTIAL_DATE, SEQUENCE, SEQUENCE_NOISE,
    STANDARD_DATE, STANDARD_DATE_LABELED, STANDARD_DATE_SPACED, TEXTUAL_MONTH,
};
use super::{DateMatch, FieldExtractor};
use crate::models::MatchType;

/// A group of regexes producing matches of one type.
///
/// The matched value is capture group 1 when present, else the whole match.
#[derive(Debug, Clone)]
pub struct PatternFamily {
    match_type: MatchType,
    patterns: Vec<Regex>,
    strip_separators: bool,
}

impl PatternFamily {
    pub fn new(match_type: MatchType, patterns: impl IntoIterator<Item = Regex>) -> Self {
        Self {
            match_type,
            patterns: patterns.into_iter().collect(),
            strip_separators: false,
        }
    }

    /// Drop whitespace and separators from matched values.
    pub fn with_stripped_separators(mut self) -> Self {
        self.strip_separators = true;
        self
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// All matches of this family in `text`.
    pub fn find_all(&self, text: &str) -> Vec<DateMatch> {
        let mut results = Vec::new();
        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };

                let value = if self.strip_separators {
                    SEQUENCE_NOISE.replace_all(m.as_str(), "").into_owned()
                } else {
                    m.as_str().trim().to_string()
                };
                results.push(DateMatch::new(value, self.match_type).with_position(m.start(), m.end()));
            }
        }
        results
    }
}

/// Runs every pattern family over a fragment's text.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    families: Vec<PatternFamily>,
}

impl PatternExtractor {
    /// Extractor with the built-in catalog.
    pub fn new() -> Self {
        Self {
            families: default_catalog(),
        }
    }

    /// Extractor with no families.
    pub fn empty() -> Self {
        Self {
            families: Vec::new(),
        }
    }

    /// Append a family to the catalog.
    pub fn with_family(mut self, family: PatternFamily) -> Self {
        self.families.push(family);
        self
    }

    pub fn families(&self) -> &[PatternFamily] {
        &self.families
    }

    /// Raw date matches in `text`, one per distinct `(type, value)`.
    ///
    /// Partial and month/year matches lying inside a full date match are
    /// dropped: "12/05" in "12/05/2019" is not a date of its own.
    pub fn extract_matches(&self, text: &str) -> Vec<DateMatch> {
        let matches: Vec<DateMatch> = self
            .families
            .iter()
            .flat_map(|family| family.find_all(text))
            .collect();

        let full_spans: Vec<(usize, usize)> = matches
            .iter()
            .filter(|m| is_full_date(m.match_type))
            .filter_map(|m| m.position)
            .collect();

        let mut seen = HashSet::new();
        matches
            .into_iter()
            .filter(|m| !is_embedded(m, &full_spans))
            .filter(|m| seen.insert((m.match_type, m.value.clone())))
            .collect()
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PatternExtractor {
    type Output = DateMatch;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.extract_matches(text)
    }
}

/// Types whose matches carry day, month and year in one printed date.
fn is_full_date(match_type: MatchType) -> bool {
    matches!(match_type, MatchType::Standard | MatchType::Fuzzy)
}

fn is_embedded(m: &DateMatch, full_spans: &[(usize, usize)]) -> bool {
    if !matches!(m.match_type, MatchType::Partial | MatchType::MonthYear) {
        return false;
    }
    let Some((start, end)) = m.position else {
        return false;
    };
    full_spans
        .iter()
        .any(|&(full_start, full_end)| full_start <= start && end <= full_end)
}

fn default_catalog() -> Vec<PatternFamily> {
    vec![
        PatternFamily::new(
            MatchType::Standard,
            [
                STANDARD_DATE.clone(),
                STANDARD_DATE_LABELED.clone(),
                STANDARD_DATE_SPACED.clone(),
            ],
        ),
        PatternFamily::new(MatchType::MonthYear, [MONTH_YEAR.clone(), MONTH_YEAR_SPACED.clone()]),
        PatternFamily::new(MatchType::Sequence, [SEQUENCE.clone()]).with_stripped_separators(),
        PatternFamily::new(MatchType::Textual, [TEXTUAL_MONTH.clone()]),
        PatternFamily::new(MatchType::Fuzzy, [FUZZY_DATE.clone()]),
        PatternFamily::new(MatchType::Partial, [PARTIAL_DATE.clone()]),
    ]
}
