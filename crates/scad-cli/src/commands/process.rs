//! Process command - extract the expiration date from a single fragment dump.

use std::fs;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use scad_core::expiry::ExtractionStep;
use scad_core::{ExtractionOutcome, ocr};

use super::{OutputFormat, build_extractor, format_outcome, load_config, load_fragments};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Fragment dump (JSON array of {text, frame})
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show extraction confidence details
    #[arg(long)]
    show_confidence: bool,

    /// Date to reason against instead of today (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<NaiveDate>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let fragments = load_fragments(&args.input)?;
    let extractor = build_extractor(&config, args.reference_date);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    let mut observer = |step: ExtractionStep| {
        pb.set_message(step.label());
        pb.set_position(u64::from(step.percent()));
        ControlFlow::Continue(())
    };
    let result = extractor.extract_with_progress(&fragments, &mut observer);
    pb.finish_and_clear();

    let outcome = ExtractionOutcome::from_result(result, ocr::raw_text(&fragments));
    let output = format_outcome(&outcome, args.format, config.extraction.min_confidence)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }

    if args.show_confidence {
        println!();
        match outcome.confidence {
            Some(confidence) => {
                println!(
                    "{} Extraction confidence: {:.0}%",
                    style("ℹ").blue(),
                    confidence * 100.0
                );
                if outcome.needs_confirmation(config.extraction.min_confidence) {
                    println!(
                        "{} Below {:.0}%, ask the user to confirm",
                        style("!").yellow(),
                        config.extraction.min_confidence * 100.0
                    );
                }
            }
            None => println!("{} No date extracted", style("ℹ").blue()),
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
