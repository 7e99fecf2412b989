//! Data models and configuration.

pub mod config;
pub mod expiry;

pub use config::{DictionaryConfig, ExtractionConfig, GeometryConfig, ScadConfig};
pub use expiry::{DateCandidate, ExtractionOutcome, MatchType};
