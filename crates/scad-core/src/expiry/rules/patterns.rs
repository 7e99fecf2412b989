//! Regex patterns for expiration date extraction.
//!
//! Matching runs on cleaned, upper-cased fragment text. Separators are any of
//! `/ \ - .` with optional whitespace around them.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Standard dates: 12/05/2025, 12-05-25, 12 . 05 . 2025
    pub static ref STANDARD_DATE: Regex = Regex::new(
        r"\b(\d{1,2}\s*[/\\\-.]\s*\d{1,2}\s*[/\\\-.]\s*(?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Keyword-prefixed dates, also glued to the keyword: SCAD12/05/2025
    pub static ref STANDARD_DATE_LABELED: Regex = Regex::new(
        r"(?i)(?:SCAD|EXPIRES?|EXP|BEST BEFORE|USE BY|VALIDO FINO)[\s:]*(\d{1,2}\s*[/\\\-.]\s*\d{1,2}\s*[/\\\-.]\s*(?:\d{4}|\d{2}))"
    ).unwrap();

    // Space-separated dates: 12 05 2025
    pub static ref STANDARD_DATE_SPACED: Regex = Regex::new(
        r"\b(\d{1,2}\s+\d{1,2}\s+(?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Month/year with separator: 08/2026, 08-26
    pub static ref MONTH_YEAR: Regex = Regex::new(
        r"\b((?:0?[1-9]|1[0-2])\s*[/\\\-.]\s*(?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Month/year with space, optionally after "FINE": FINE: 08 2026
    pub static ref MONTH_YEAR_SPACED: Regex = Regex::new(
        r"(?i)(?:FINE[:\s]*)?\b((?:0?[1-9]|1[0-2])\s+(?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Digit runs, possibly split by separators between the digit pairs:
    // 150125, 15012025, 2911 2038
    pub static ref SEQUENCE: Regex = Regex::new(
        r"\b(\d{2}[\s/\\\-.]*\d{2}[\s/\\\-.]*(?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Textual month: 15 GEN 2025, 15 OTT 26
    pub static ref TEXTUAL_MONTH: Regex = Regex::new(
        r"(?i)\b(\d{1,2}\s+[A-Z]{3,9}\s+(?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Missing separator before the year: 14.012027
    pub static ref FUZZY_DATE: Regex = Regex::new(
        r"\b(\d{1,2}[./\-]\d{1,2}\d{4})\b"
    ).unwrap();

    // Day/month without year: 30/08
    pub static ref PARTIAL_DATE: Regex = Regex::new(
        r"\b(\d{1,2}\s*[/\\\-.]\s*(?:1[0-2]|0?[1-9]))\b"
    ).unwrap();

    // Characters dropped from sequence values.
    pub static ref SEQUENCE_NOISE: Regex = Regex::new(r"[\s/\\\-.]").unwrap();

    // Separator with surrounding whitespace, collapsed before template parsing.
    pub static ref PADDED_SEPARATOR: Regex = Regex::new(r"\s*([/\\\-.])\s*").unwrap();

    // Run of whitespace.
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Fuzzy value split into parts.
    pub static ref FUZZY_PARTS: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})(\d{4})$"
    ).unwrap();

    // Partial value split into parts.
    pub static ref PARTIAL_PARTS: Regex = Regex::new(
        r"^(\d{1,2})\s*[/\\\-.]\s*(\d{1,2})$"
    ).unwrap();

    // Month/year value split into parts.
    pub static ref MONTH_YEAR_PARTS: Regex = Regex::new(
        r"^(\d{1,2})\s*[/\\\-.\s]\s*(\d{4}|\d{2})$"
    ).unwrap();
}
