//! Progress reporting and cooperative cancellation.

use std::fmt;
use std::ops::ControlFlow;

use serde::Serialize;

/// Checkpoints of one extraction call, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionStep {
    Preparing,
    FindingAnchors,
    MatchingPatterns,
    RankingCandidates,
    Completed,
}

impl ExtractionStep {
    pub const ALL: [ExtractionStep; 5] = [
        ExtractionStep::Preparing,
        ExtractionStep::FindingAnchors,
        ExtractionStep::MatchingPatterns,
        ExtractionStep::RankingCandidates,
        ExtractionStep::Completed,
    ];

    /// Completion percentage reached at this step.
    pub fn percent(&self) -> u8 {
        match self {
            ExtractionStep::Preparing => 0,
            ExtractionStep::FindingAnchors => 25,
            ExtractionStep::MatchingPatterns => 50,
            ExtractionStep::RankingCandidates => 75,
            ExtractionStep::Completed => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractionStep::Preparing => "Preparing text",
            ExtractionStep::FindingAnchors => "Finding expiration labels",
            ExtractionStep::MatchingPatterns => "Matching date patterns",
            ExtractionStep::RankingCandidates => "Ranking candidates",
            ExtractionStep::Completed => "Done",
        }
    }
}

impl fmt::Display for ExtractionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}%)", self.label(), self.percent())
    }
}

/// Receives checkpoints; returning `Break` cancels the extraction.
pub trait ProgressObserver {
    fn on_step(&mut self, step: ExtractionStep) -> ControlFlow<()>;
}

impl<F> ProgressObserver for F
where
    F: FnMut(ExtractionStep) -> ControlFlow<()>,
{
    fn on_step(&mut self, step: ExtractionStep) -> ControlFlow<()> {
        self(step)
    }
}

/// Observer that ignores every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_step(&mut self, _step: ExtractionStep) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages_increase() {
        let percents: Vec<u8> = ExtractionStep::ALL.iter().map(|s| s.percent()).collect();
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        let mut observer = |step: ExtractionStep| {
            seen.push(step);
            ControlFlow::Continue(())
        };

        assert!(observer.on_step(ExtractionStep::Preparing).is_continue());
        assert!(NoProgress.on_step(ExtractionStep::Completed).is_continue());
        assert_eq!(seen, vec![ExtractionStep::Preparing]);
    }
}
