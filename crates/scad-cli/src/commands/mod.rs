//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use scad_core::models::config::ScadConfig;
use scad_core::{ExpirationExtractor, ExtractionOutcome, TextFragment};

/// Output format for extraction results.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

/// A fragment dump: either a bare array or an object with a `fragments` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum FragmentDump {
    Bare(Vec<TextFragment>),
    Wrapped { fragments: Vec<TextFragment> },
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scad")
        .join("config.json")
}

/// Load the configuration from `path`, falling back to defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<ScadConfig> {
    match path {
        Some(path) => Ok(ScadConfig::from_file(Path::new(path))?),
        None => Ok(ScadConfig::default()),
    }
}

/// Read OCR fragments from a JSON dump.
pub fn load_fragments(path: &Path) -> anyhow::Result<Vec<TextFragment>> {
    let content = fs::read_to_string(path)?;
    let dump: FragmentDump = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid fragment dump {}: {}", path.display(), e))?;

    let fragments = match dump {
        FragmentDump::Bare(fragments) | FragmentDump::Wrapped { fragments } => fragments,
    };
    debug!("Loaded {} fragments from {}", fragments.len(), path.display());

    Ok(fragments)
}

pub fn build_extractor(config: &ScadConfig, reference_date: Option<NaiveDate>) -> ExpirationExtractor {
    let extractor = ExpirationExtractor::from_config(config);
    match reference_date {
        Some(date) => extractor.with_reference_date(date),
        None => extractor,
    }
}

pub fn format_outcome(
    outcome: &ExtractionOutcome,
    format: OutputFormat,
    min_confidence: f32,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(outcome)?),
        OutputFormat::Text => Ok(format_text(outcome, min_confidence)),
    }
}

fn format_text(outcome: &ExtractionOutcome, min_confidence: f32) -> String {
    let mut output = String::new();

    match (&outcome.extracted_date, outcome.match_type, outcome.confidence) {
        (Some(date), Some(match_type), Some(confidence)) => {
            output.push_str(&format!("Expiration date: {}\n", date));
            output.push_str(&format!("Match type: {}\n", match_type));
            output.push_str(&format!("Confidence: {:.2}\n", confidence));
            if outcome.needs_confirmation(min_confidence) {
                output.push_str("Needs confirmation: yes\n");
            }
        }
        _ => {
            output.push_str(&format!(
                "No expiration date: {}\n",
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    output.push_str(&format!("Raw text: {}\n", outcome.raw_text));
    output
}
