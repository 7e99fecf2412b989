//! Conversion of raw date matches into calendar dates.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::patterns::{FUZZY_PARTS, MONTH_YEAR_PARTS, PADDED_SEPARATOR, PARTIAL_PARTS, WHITESPACE};
use super::DateMatch;
use crate::error::NormalizeError;
use crate::models::config::{ExtractionConfig, DEFAULT_MONTHS};
use crate::models::MatchType;

/// A resolved calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    pub date: NaiveDate,
    /// True when the year or day was inferred rather than read.
    pub reconstructed: bool,
}

impl NormalizedDate {
    /// ISO `YYYY-MM-DD` rendering.
    pub fn formatted(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Layout of a standard date: day (optional), month and year joined by one separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTemplate {
    pub has_day: bool,
    pub separator: char,
    pub year_digits: usize,
}

/// Templates tried, in order, for standard matches.
pub const STANDARD_TEMPLATES: &[DateTemplate] = &[
    DateTemplate::day_month_year('/', 4),
    DateTemplate::day_month_year('-', 4),
    DateTemplate::day_month_year('.', 4),
    DateTemplate::day_month_year('\\', 4),
    DateTemplate::day_month_year(' ', 4),
    DateTemplate::day_month_year('/', 2),
    DateTemplate::day_month_year('-', 2),
    DateTemplate::day_month_year('.', 2),
    DateTemplate::day_month_year('\\', 2),
    DateTemplate::day_month_year(' ', 2),
    DateTemplate::month_year('/', 4),
    DateTemplate::month_year('-', 4),
    DateTemplate::month_year('.', 4),
    DateTemplate::month_year('/', 2),
    DateTemplate::month_year('-', 2),
    DateTemplate::month_year('.', 2),
];

/// Fields read by a template, before year expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TemplateFields {
    day: Option<u32>,
    month: u32,
    year: i32,
}

impl DateTemplate {
    pub const fn day_month_year(separator: char, year_digits: usize) -> Self {
        Self {
            has_day: true,
            separator,
            year_digits,
        }
    }

    pub const fn month_year(separator: char, year_digits: usize) -> Self {
        Self {
            has_day: false,
            separator,
            year_digits,
        }
    }

    /// Render `date` in this layout.
    pub fn render(&self, date: NaiveDate) -> String {
        let year = if self.year_digits == 2 {
            format!("{:02}", date.year().rem_euclid(100))
        } else {
            format!("{:04}", date.year())
        };

        let sep = self.separator;
        if self.has_day {
            format!("{:02}{sep}{:02}{sep}{year}", date.day(), date.month())
        } else {
            format!("{:02}{sep}{year}", date.month())
        }
    }

    fn parse(&self, text: &str) -> Option<TemplateFields> {
        let parts: Vec<&str> = text.split(self.separator).collect();
        let expected = if self.has_day { 3 } else { 2 };
        if parts.len() != expected {
            return None;
        }

        let year_part = parts[expected - 1];
        if year_part.len() != self.year_digits || !is_digits(year_part) {
            return None;
        }
        let year = year_part.parse().ok()?;

        let (day, month) = if self.has_day {
            (Some(small_number(parts[0])?), small_number(parts[1])?)
        } else {
            (None, small_number(parts[0])?)
        };

        Some(TemplateFields { day, month, year })
    }
}

impl fmt::Display for DateTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = "y".repeat(self.year_digits);
        if self.has_day {
            write!(f, "dd{0}MM{0}{1}", self.separator, year)
        } else {
            write!(f, "MM{}{}", self.separator, year)
        }
    }
}

/// Two-digit years below 50 land in the 2000s, the rest in the 1900s.
pub fn expand_two_digit_year(year: i32) -> i32 {
    if year < 50 { 2000 + year } else { 1900 + year }
}

/// Last day of `month` in `year`, or `None` for an invalid month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_first.signed_duration_since(first).num_days() as u32)
}

/// Turns [`DateMatch`] values into validated dates.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    reference_date: NaiveDate,
    min_year: i32,
    max_year_offset: i32,
    months: BTreeMap<String, u32>,
}

impl DateNormalizer {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self::from_config(&ExtractionConfig::default(), reference_date)
    }

    pub fn from_config(config: &ExtractionConfig, reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            min_year: config.min_year,
            max_year_offset: config.max_year_offset,
            months: DEFAULT_MONTHS
                .iter()
                .map(|(name, month)| (name.to_string(), *month))
                .collect(),
        }
    }

    /// Replace the month-name dictionary. Keys are matched upper-cased.
    pub fn with_months(mut self, months: &BTreeMap<String, u32>) -> Self {
        self.months = months
            .iter()
            .map(|(name, month)| (name.trim().to_uppercase(), *month))
            .collect();
        self
    }

    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Latest accepted year.
    pub fn max_year(&self) -> i32 {
        self.reference_date.year().saturating_add(self.max_year_offset)
    }

    /// Check `year` against the accepted window.
    pub fn validate_year(&self, year: i32) -> Result<(), NormalizeError> {
        if year < self.min_year {
            Err(NormalizeError::YearTooOld)
        } else if year > self.max_year() {
            Err(NormalizeError::YearTooFarInFuture)
        } else {
            Ok(())
        }
    }

    /// Resolve a match according to its type.
    pub fn normalize(&self, m: &DateMatch) -> Result<NormalizedDate, NormalizeError> {
        let value = m.value.trim();
        if value.is_empty() {
            return Err(NormalizeError::InvalidInput);
        }

        match m.match_type {
            MatchType::Standard => self.normalize_standard(value),
            MatchType::Textual => self.normalize_textual(value),
            MatchType::MonthYear => self.normalize_month_year(value),
            MatchType::Sequence => self.normalize_sequence(value),
            MatchType::Fuzzy => self.normalize_fuzzy(value),
            MatchType::Partial => self.normalize_partial(value),
        }
    }

    fn normalize_standard(&self, value: &str) -> Result<NormalizedDate, NormalizeError> {
        let collapsed = PADDED_SEPARATOR.replace_all(value, "$1");
        let collapsed = WHITESPACE.replace_all(&collapsed, " ");

        let mut window_error = None;
        for template in STANDARD_TEMPLATES {
            let Some(fields) = template.parse(&collapsed) else {
                continue;
            };

            let two_digit = template.year_digits == 2;
            let year = if two_digit {
                expand_two_digit_year(fields.year)
            } else {
                fields.year
            };

            let resolved = match fields.day {
                Some(day) => self.build(year, fields.month, day, two_digit),
                None => self.month_end(year, fields.month),
            };

            match resolved {
                Ok(date) => return Ok(date),
                Err(err) if err.is_year_window() => {
                    window_error.get_or_insert(err);
                }
                Err(_) => {}
            }
        }

        Err(window_error.unwrap_or(NormalizeError::UnableToParse))
    }

    fn normalize_textual(&self, value: &str) -> Result<NormalizedDate, NormalizeError> {
        let parts: Vec<&str> = value.split_whitespace().collect();
        let [day, month, year] = parts.as_slice() else {
            return Err(NormalizeError::InvalidInput);
        };

        let month = *self
            .months
            .get(&month.to_uppercase())
            .ok_or(NormalizeError::UnknownMonth)?;
        let day: u32 = day.parse().map_err(|_| NormalizeError::InvalidDay)?;
        if !is_digits(year) {
            return Err(NormalizeError::UnableToParse);
        }
        let (year, reconstructed) = read_year(year)?;

        self.build(year, month, day, reconstructed)
    }

    fn normalize_month_year(&self, value: &str) -> Result<NormalizedDate, NormalizeError> {
        let caps = MONTH_YEAR_PARTS
            .captures(value)
            .ok_or(NormalizeError::UnableToParse)?;
        let month: u32 = caps[1].parse().map_err(|_| NormalizeError::UnableToParse)?;
        let (year, _) = read_year(&caps[2])?;

        self.month_end(year, month)
    }

    fn normalize_sequence(&self, value: &str) -> Result<NormalizedDate, NormalizeError> {
        if !is_digits(value) || !(value.len() == 6 || value.len() == 8) {
            return Err(NormalizeError::InvalidInput);
        }

        let day: u32 = value[0..2].parse().map_err(|_| NormalizeError::InvalidInput)?;
        let month: u32 = value[2..4].parse().map_err(|_| NormalizeError::InvalidInput)?;
        let (year, _) = read_year(&value[4..])?;

        self.build(year, month, day, true)
    }

    fn normalize_fuzzy(&self, value: &str) -> Result<NormalizedDate, NormalizeError> {
        let caps = FUZZY_PARTS.captures(value).ok_or(NormalizeError::UnableToParse)?;
        let day: u32 = caps[1].parse().map_err(|_| NormalizeError::InvalidDay)?;
        let month: u32 = caps[2].parse().map_err(|_| NormalizeError::InvalidDate)?;
        let year: i32 = caps[3].parse().map_err(|_| NormalizeError::UnableToParse)?;

        self.build(year, month, day, true)
    }

    /// Day/month without a year: the next occurrence on or after the reference date.
    fn normalize_partial(&self, value: &str) -> Result<NormalizedDate, NormalizeError> {
        let caps = PARTIAL_PARTS.captures(value).ok_or(NormalizeError::UnableToParse)?;
        let day: u32 = caps[1].parse().map_err(|_| NormalizeError::InvalidDay)?;
        let month: u32 = caps[2].parse().map_err(|_| NormalizeError::InvalidDate)?;

        let this_year = self.reference_date.year();
        let mut last_error = NormalizeError::InvalidDate;
        for year in [this_year, this_year + 1] {
            match self.build(year, month, day, true) {
                Ok(resolved) if resolved.date >= self.reference_date => return Ok(resolved),
                Ok(_) => {}
                Err(err) => last_error = err,
            }
        }

        Err(last_error)
    }

    fn build(
        &self,
        year: i32,
        month: u32,
        day: u32,
        reconstructed: bool,
    ) -> Result<NormalizedDate, NormalizeError> {
        if !(1..=31).contains(&day) {
            return Err(NormalizeError::InvalidDay);
        }
        if !(1..=12).contains(&month) {
            return Err(NormalizeError::InvalidDate);
        }
        self.validate_year(year)?;

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(NormalizeError::InvalidDate)?;
        Ok(NormalizedDate { date, reconstructed })
    }

    /// Month-only dates resolve to the month's last day.
    fn month_end(&self, year: i32, month: u32) -> Result<NormalizedDate, NormalizeError> {
        let day = last_day_of_month(year, month).ok_or(NormalizeError::InvalidDate)?;
        self.build(year, month, day, true)
    }
}

/// Parse a two- or four-digit year, expanding two-digit forms.
fn read_year(text: &str) -> Result<(i32, bool), NormalizeError> {
    let year: i32 = text.parse().map_err(|_| NormalizeError::UnableToParse)?;
    match text.len() {
        2 => Ok((expand_two_digit_year(year), true)),
        4 => Ok((year, false)),
        _ => Err(NormalizeError::UnableToParse),
    }
}

fn small_number(text: &str) -> Option<u32> {
    if text.is_empty() || text.len() > 2 || !is_digits(text) {
        return None;
    }
    text.parse().ok()
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn normalize(value: &str, match_type: MatchType) -> Result<NormalizedDate, NormalizeError> {
        DateNormalizer::new(reference()).normalize(&DateMatch::new(value, match_type))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_standard_dates() {
        let n = normalize("12/05/2025", MatchType::Standard).unwrap();
        assert_eq!(n.date, ymd(2025, 5, 12));
        assert!(!n.reconstructed);
        assert_eq!(n.formatted(), "2025-05-12");

        assert_eq!(normalize("12 / 05 / 2025", MatchType::Standard).unwrap().date, ymd(2025, 5, 12));
        assert_eq!(normalize("12  05  2025", MatchType::Standard).unwrap().date, ymd(2025, 5, 12));
        assert_eq!(normalize("1.2.2026", MatchType::Standard).unwrap().date, ymd(2026, 2, 1));

        let short = normalize("12-05-25", MatchType::Standard).unwrap();
        assert_eq!(short.date, ymd(2025, 5, 12));
        assert!(short.reconstructed);
    }

    #[test]
    fn test_standard_rejections() {
        assert_eq!(
            normalize("31/04/2025", MatchType::Standard),
            Err(NormalizeError::UnableToParse)
        );
        assert_eq!(
            normalize("12/05/2019", MatchType::Standard),
            Err(NormalizeError::YearTooOld)
        );
        assert_eq!(
            normalize("12/05/2046", MatchType::Standard),
            Err(NormalizeError::YearTooFarInFuture)
        );
        assert_eq!(normalize("  ", MatchType::Standard), Err(NormalizeError::InvalidInput));
    }

    #[test]
    fn test_template_round_trip() {
        let date = ymd(2026, 8, 9);
        for template in STANDARD_TEMPLATES.iter().filter(|t| t.has_day) {
            let rendered = template.render(date);
            let parsed = normalize(&rendered, MatchType::Standard).unwrap();
            assert_eq!(parsed.date, date, "template {template}");
        }

        // Month-only layouts resolve to the last day of the month.
        for template in STANDARD_TEMPLATES.iter().filter(|t| !t.has_day) {
            let rendered = template.render(date);
            let parsed = normalize(&rendered, MatchType::Standard).unwrap();
            assert_eq!(parsed.date, ymd(2026, 8, 31), "template {template}");
            assert!(parsed.reconstructed, "template {template}");
        }
        assert_eq!(
            normalize("02/2028", MatchType::Standard).unwrap().date,
            ymd(2028, 2, 29)
        );

        assert_eq!(DateTemplate::day_month_year('/', 4).to_string(), "dd/MM/yyyy");
        assert_eq!(DateTemplate::month_year('.', 2).to_string(), "MM.yy");
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(expand_two_digit_year(25), 2025);
        assert_eq!(expand_two_digit_year(49), 2049);
        assert_eq!(expand_two_digit_year(50), 1950);
        assert_eq!(expand_two_digit_year(99), 1999);
    }

    #[test]
    fn test_month_year_resolves_to_month_end() {
        let n = normalize("08/2026", MatchType::MonthYear).unwrap();
        assert_eq!(n.date, ymd(2026, 8, 31));
        assert!(n.reconstructed);

        assert_eq!(normalize("02 28", MatchType::MonthYear).unwrap().date, ymd(2028, 2, 29));
        assert_eq!(normalize("12/05", MatchType::MonthYear), Err(NormalizeError::YearTooOld));
        assert_eq!(last_day_of_month(2024, 2), Some(29));
        assert_eq!(last_day_of_month(2025, 12), Some(31));
        assert_eq!(last_day_of_month(2025, 13), None);
    }

    #[test]
    fn test_textual_months() {
        let n = normalize("14 SET 25", MatchType::Textual).unwrap();
        assert_eq!(n.date, ymd(2025, 9, 14));
        assert!(n.reconstructed);

        let n = normalize("15 dec 2026", MatchType::Textual).unwrap();
        assert_eq!(n.date, ymd(2026, 12, 15));
        assert!(!n.reconstructed);

        assert_eq!(normalize("15 FOO 2025", MatchType::Textual), Err(NormalizeError::UnknownMonth));
        assert_eq!(normalize("45 GEN 2025", MatchType::Textual), Err(NormalizeError::InvalidDay));
        assert_eq!(normalize("31 APR 2025", MatchType::Textual), Err(NormalizeError::InvalidDate));
    }

    #[test]
    fn test_custom_month_dictionary() {
        let months = BTreeMap::from([("mär".to_string(), 3)]);
        let normalizer = DateNormalizer::new(reference()).with_months(&months);

        let n = normalizer
            .normalize(&DateMatch::new("12 MÄR 2026", MatchType::Textual))
            .unwrap();
        assert_eq!(n.date, ymd(2026, 3, 12));
        assert_eq!(
            normalizer.normalize(&DateMatch::new("12 GEN 2026", MatchType::Textual)),
            Err(NormalizeError::UnknownMonth)
        );
    }

    #[test]
    fn test_sequences() {
        assert_eq!(normalize("150125", MatchType::Sequence).unwrap().date, ymd(2025, 1, 15));
        assert_eq!(normalize("29112038", MatchType::Sequence).unwrap().date, ymd(2038, 11, 29));
        assert_eq!(normalize("1501202", MatchType::Sequence), Err(NormalizeError::InvalidInput));
        assert_eq!(normalize("991301", MatchType::Sequence), Err(NormalizeError::InvalidDay));
        assert_eq!(normalize("123456", MatchType::Sequence), Err(NormalizeError::InvalidDate));
    }

    #[test]
    fn test_fuzzy() {
        let n = normalize("14.012027", MatchType::Fuzzy).unwrap();
        assert_eq!(n.date, ymd(2027, 1, 14));
        assert!(n.reconstructed);
    }

    #[test]
    fn test_partial_takes_next_occurrence() {
        let n = normalize("30/08", MatchType::Partial).unwrap();
        assert_eq!(n.date, ymd(2025, 8, 30));
        assert!(n.reconstructed);

        assert_eq!(normalize("15/01", MatchType::Partial).unwrap().date, ymd(2026, 1, 15));
        assert_eq!(normalize("01/03", MatchType::Partial).unwrap().date, ymd(2025, 3, 1));
        assert_eq!(normalize("29/02", MatchType::Partial), Err(NormalizeError::InvalidDate));
        assert_eq!(normalize("32/01", MatchType::Partial), Err(NormalizeError::InvalidDay));
    }

    #[test]
    fn test_year_window_applies_to_every_type() {
        let cases = [
            ("12/05/{}", MatchType::Standard),
            ("12 GEN {}", MatchType::Textual),
            ("05/{}", MatchType::MonthYear),
            ("1205{}", MatchType::Sequence),
            ("12.05{}", MatchType::Fuzzy),
        ];
        for (template, match_type) in cases {
            let old = template.replace("{}", "2019");
            let far = template.replace("{}", "2046");
            assert_eq!(normalize(&old, match_type), Err(NormalizeError::YearTooOld), "{old}");
            assert_eq!(
                normalize(&far, match_type),
                Err(NormalizeError::YearTooFarInFuture),
                "{far}"
            );
        }

        let config = ExtractionConfig {
            min_year: 2030,
            ..Default::default()
        };
        let normalizer = DateNormalizer::from_config(&config, reference());
        assert_eq!(
            normalizer.normalize(&DateMatch::new("30/08", MatchType::Partial)),
            Err(NormalizeError::YearTooOld)
        );
    }

    #[test]
    fn test_year_window_follows_config() {
        let config = ExtractionConfig {
            min_year: 2000,
            max_year_offset: 1,
            ..Default::default()
        };
        let normalizer = DateNormalizer::from_config(&config, reference());

        assert_eq!(normalizer.max_year(), 2026);
        assert!(normalizer.validate_year(2010).is_ok());
        assert_eq!(normalizer.validate_year(2027), Err(NormalizeError::YearTooFarInFuture));
    }

    #[test]
    fn test_huge_year_offset_saturates() {
        let config = ExtractionConfig {
            max_year_offset: i32::MAX,
            ..Default::default()
        };
        let normalizer = DateNormalizer::from_config(&config, reference());

        assert_eq!(normalizer.max_year(), i32::MAX);
        let n = normalizer
            .normalize(&DateMatch::new("12/05/2090", MatchType::Standard))
            .unwrap();
        assert_eq!(n.date, ymd(2090, 5, 12));
    }
}
