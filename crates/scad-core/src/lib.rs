//! Core library for expiration date extraction from OCR text.
//!
//! This crate provides:
//! - Fragment cleanup, expiration label detection and spatial relations
//! - A catalog of date patterns with per-format normalization
//! - Confidence scoring and candidate selection
//! - Configuration and result models

pub mod error;
pub mod expiry;
pub mod models;
pub mod ocr;

pub use error::{ExtractionError, NormalizeError, Result, ScadError};
pub use expiry::{ExpirationExtractor, ExpiryExtractor, ExtractionStep, ProgressObserver};
pub use models::config::ScadConfig;
pub use models::expiry::{DateCandidate, ExtractionOutcome, MatchType};
pub use ocr::{is_expiration_anchor, Rectangle, TextFragment};
