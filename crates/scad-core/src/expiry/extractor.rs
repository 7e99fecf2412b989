//! Candidate selection over a set of OCR fragments.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{Local, Months, NaiveDate};
use tracing::{debug, info, warn};

use crate::models::{DateCandidate, ExtractionOutcome, MatchType, ScadConfig};
use crate::ocr::{self, clean_fragment_text, AnchorDetector, GeometricRelator, TextFragment};

use super::progress::{ExtractionStep, NoProgress, ProgressObserver};
use super::rules::{ConfidenceFactors, DateNormalizer, PatternExtractor};
use super::{ExpiryExtractor, Result};
use crate::error::ExtractionError;

/// Rule-based expiration date extractor.
///
/// Holds no mutable state; one value can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct ExpirationExtractor {
    anchors: AnchorDetector,
    relator: GeometricRelator,
    patterns: PatternExtractor,
    normalizer: DateNormalizer,
    past_tolerance_years: u32,
}

/// A fragment that survived input checks, with its cleaned text.
#[derive(Debug)]
struct PreparedFragment<'a> {
    index: usize,
    cleaned: String,
    source: &'a TextFragment,
}

/// A fragment scheduled for matching in one pass.
#[derive(Debug, Clone, Copy)]
struct ScanTarget {
    fragment: usize,
    keyword_context: bool,
    anchor_distance: Option<f32>,
}

/// A normalized match awaiting its score.
#[derive(Debug)]
struct Pending {
    date: NaiveDate,
    match_type: MatchType,
    reconstructed: bool,
    target: ScanTarget,
}

#[derive(Debug, Default)]
struct PassResult {
    pending: Vec<Pending>,
    matched: usize,
    rejected: usize,
}

impl ExpirationExtractor {
    /// Extractor with default configuration and today's date as reference.
    pub fn new() -> Self {
        Self::from_config(&ScadConfig::default())
    }

    /// Extractor built from `config`, reasoning against today's local date.
    pub fn from_config(config: &ScadConfig) -> Self {
        Self::from_config_at(config, Local::now().date_naive())
    }

    /// Extractor built from `config` with an explicit reference date.
    pub fn from_config_at(config: &ScadConfig, reference_date: NaiveDate) -> Self {
        Self {
            anchors: AnchorDetector::new(&config.dictionaries.anchor_keywords),
            relator: GeometricRelator::new(&config.geometry),
            patterns: PatternExtractor::new(),
            normalizer: DateNormalizer::from_config(&config.extraction, reference_date)
                .with_months(&config.dictionaries.months),
            past_tolerance_years: config.extraction.past_tolerance_years,
        }
    }

    /// Reason against `date` instead of today.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.normalizer = self.normalizer.with_reference_date(date);
        self
    }

    /// Replace the pattern catalog.
    pub fn with_patterns(mut self, patterns: PatternExtractor) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.normalizer.reference_date()
    }

    /// Run the pipeline, reporting checkpoints to `observer`.
    pub fn extract_with_progress(
        &self,
        fragments: &[TextFragment],
        observer: &mut impl ProgressObserver,
    ) -> Result<DateCandidate> {
        let start = Instant::now();

        checkpoint(observer, ExtractionStep::Preparing)?;
        let prepared = prepare(fragments)?;

        checkpoint(observer, ExtractionStep::FindingAnchors)?;
        let targets = self.anchored_targets(&prepared);
        debug!("{} anchored fragment(s) of {}", targets.len(), prepared.len());

        checkpoint(observer, ExtractionStep::MatchingPatterns)?;
        let mut pass = self.evaluate(&prepared, &targets);
        let mut matched = pass.matched;
        info!(
            "Anchored pass: {} match(es), {} valid, {} rejected",
            pass.matched,
            pass.pending.len(),
            pass.rejected
        );

        if pass.pending.is_empty() {
            let everything: Vec<ScanTarget> = (0..prepared.len())
                .map(|fragment| ScanTarget {
                    fragment,
                    keyword_context: false,
                    anchor_distance: None,
                })
                .collect();

            pass = self.evaluate(&prepared, &everything);
            matched += pass.matched;
            info!(
                "Fallback pass: {} match(es), {} valid, {} rejected",
                pass.matched,
                pass.pending.len(),
                pass.rejected
            );
        }

        checkpoint(observer, ExtractionStep::RankingCandidates)?;
        let best = self.select(&prepared, pass);

        checkpoint(observer, ExtractionStep::Completed)?;
        match best {
            Some(candidate) => {
                info!(
                    "Selected {} ({}, confidence {:.2}) in {:?}",
                    candidate.formatted_date,
                    candidate.match_type,
                    candidate.confidence,
                    start.elapsed()
                );
                Ok(candidate)
            }
            None if matched == 0 => Err(ExtractionError::NoMatchFound),
            None => Err(ExtractionError::AllCandidatesRejected),
        }
    }

    /// Run the pipeline and convert the result into the UI contract.
    pub fn extract_outcome(&self, fragments: &[TextFragment]) -> ExtractionOutcome {
        ExtractionOutcome::from_result(self.extract(fragments), ocr::raw_text(fragments))
    }

    /// For each anchor: its own text inline, plus the nearest related
    /// fragment that contains a date-like match.
    fn anchored_targets(&self, prepared: &[PreparedFragment<'_>]) -> Vec<ScanTarget> {
        let mut targets: BTreeMap<usize, ScanTarget> = BTreeMap::new();

        let anchors = prepared
            .iter()
            .enumerate()
            .filter(|(_, f)| self.anchors.is_expiration_anchor(&f.cleaned));

        for (anchor_pos, anchor) in anchors {
            debug!("Anchor: {:?}", anchor.cleaned);
            merge_target(
                &mut targets,
                ScanTarget {
                    fragment: anchor_pos,
                    keyword_context: false,
                    anchor_distance: Some(0.0),
                },
            );

            let linked = prepared
                .iter()
                .enumerate()
                .filter(|(pos, _)| *pos != anchor_pos)
                .filter_map(|(pos, other)| {
                    let (relation, distance) = self
                        .relator
                        .link(&anchor.source.frame, &other.source.frame)?;
                    Some((pos, relation, distance))
                })
                .filter(|(pos, _, _)| {
                    !self.patterns.extract_matches(&prepared[*pos].cleaned).is_empty()
                })
                .min_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));

            if let Some((pos, relation, distance)) = linked {
                debug!(
                    "Linked {:?} ({:?}, distance {:.1})",
                    prepared[pos].cleaned, relation, distance
                );
                merge_target(
                    &mut targets,
                    ScanTarget {
                        fragment: pos,
                        keyword_context: true,
                        anchor_distance: Some(distance),
                    },
                );
            }
        }

        targets.into_values().collect()
    }

    fn evaluate(&self, prepared: &[PreparedFragment<'_>], targets: &[ScanTarget]) -> PassResult {
        let cutoff = self.past_cutoff();
        let mut result = PassResult::default();

        for target in targets {
            let fragment = &prepared[target.fragment];
            for m in self.patterns.extract_matches(&fragment.cleaned) {
                result.matched += 1;

                match self.normalizer.normalize(&m) {
                    Ok(normalized) if normalized.date < cutoff => {
                        debug!("Rejected {} {:?}: before {}", m.match_type, m.value, cutoff);
                        result.rejected += 1;
                    }
                    Ok(normalized) => {
                        debug!("Accepted {} {:?} as {}", m.match_type, m.value, normalized.date);
                        result.pending.push(Pending {
                            date: normalized.date,
                            match_type: m.match_type,
                            reconstructed: normalized.reconstructed,
                            target: *target,
                        });
                    }
                    Err(err) => {
                        debug!("Rejected {} {:?}: {}", m.match_type, m.value, err);
                        result.rejected += 1;
                    }
                }
            }
        }

        result
    }

    fn select(&self, prepared: &[PreparedFragment<'_>], pass: PassResult) -> Option<DateCandidate> {
        let valid = pass.pending.len();
        let rejected = pass.rejected;

        pass.pending
            .into_iter()
            .map(|p| {
                let confidence = ConfidenceFactors {
                    match_type: p.match_type,
                    has_keyword_context: p.target.keyword_context,
                    was_reconstructed: p.reconstructed,
                    valid_dates_count: valid,
                    rejected_dates_count: rejected,
                }
                .score();

                (
                    prepared[p.target.fragment].index,
                    DateCandidate {
                        date: p.date,
                        formatted_date: p.date.format("%Y-%m-%d").to_string(),
                        match_type: p.match_type,
                        confidence,
                        source_fragment: prepared[p.target.fragment].source.clone(),
                        anchor_distance: p.target.anchor_distance,
                    },
                )
            })
            .min_by(|(ia, a), (ib, b)| rank(a, b).then(ia.cmp(ib)))
            .map(|(_, candidate)| candidate)
    }

    /// Dates before this are implausible for a product being scanned now.
    fn past_cutoff(&self) -> NaiveDate {
        let reference = self.reference_date();
        self.past_tolerance_years
            .checked_mul(12)
            .and_then(|months| reference.checked_sub_months(Months::new(months)))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl Default for ExpirationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpiryExtractor for ExpirationExtractor {
    fn extract(&self, fragments: &[TextFragment]) -> Result<DateCandidate> {
        self.extract_with_progress(fragments, &mut NoProgress)
    }

    fn extract_from_text(&self, text: &str) -> Result<DateCandidate> {
        self.extract(&[TextFragment::new(text, ocr::Rectangle::default())])
    }
}

fn checkpoint(observer: &mut impl ProgressObserver, step: ExtractionStep) -> Result<()> {
    if observer.on_step(step).is_break() {
        info!("Extraction cancelled at {}", step.label());
        return Err(ExtractionError::Cancelled);
    }
    Ok(())
}

/// Clean usable fragments. Blank ones are skipped, malformed frames dropped.
fn prepare(fragments: &[TextFragment]) -> Result<Vec<PreparedFragment<'_>>> {
    let mut prepared = Vec::with_capacity(fragments.len());
    let mut malformed = 0;

    for (index, fragment) in fragments.iter().enumerate() {
        if fragment.is_blank() {
            continue;
        }
        if !fragment.frame.is_well_formed() {
            warn!("Dropping fragment {} with malformed frame {:?}", index, fragment.frame);
            malformed += 1;
            continue;
        }

        prepared.push(PreparedFragment {
            index,
            cleaned: clean_fragment_text(&fragment.text),
            source: fragment,
        });
    }

    if prepared.is_empty() && malformed > 0 {
        return Err(ExtractionError::InvalidInput(format!(
            "all {} non-empty fragment(s) have malformed frames",
            malformed
        )));
    }

    Ok(prepared)
}

/// Keep one target per fragment, preferring keyword context, then the closer anchor.
fn merge_target(targets: &mut BTreeMap<usize, ScanTarget>, target: ScanTarget) {
    match targets.get_mut(&target.fragment) {
        Some(existing) => {
            let better = match (target.keyword_context, existing.keyword_context) {
                (true, false) => true,
                (false, true) => false,
                _ => distance_key(target.anchor_distance) < distance_key(existing.anchor_distance),
            };
            if better {
                *existing = target;
            }
        }
        None => {
            targets.insert(target.fragment, target);
        }
    }
}

/// Missing anchor distance sorts after every real one.
fn distance_key(distance: Option<f32>) -> f32 {
    distance.unwrap_or(f32::INFINITY)
}

/// `Less` when `a` should win over `b`.
fn rank(a: &DateCandidate, b: &DateCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| {
            b.match_type
                .base_weight_percent()
                .cmp(&a.match_type.base_weight_percent())
        })
        .then_with(|| distance_key(a.anchor_distance).total_cmp(&distance_key(b.anchor_distance)))
        .then_with(|| a.date.cmp(&b.date))
}
