//! Expiration date extraction module.

mod extractor;
pub mod progress;
pub mod rules;

pub use extractor::ExpirationExtractor;
pub use progress::{ExtractionStep, NoProgress, ProgressObserver};

use crate::error::ExtractionError;
use crate::models::DateCandidate;
use crate::ocr::TextFragment;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for expiration date extractors.
pub trait ExpiryExtractor {
    /// Extract the expiration date from one OCR pass.
    fn extract(&self, fragments: &[TextFragment]) -> Result<DateCandidate>;

    /// Extract the expiration date from plain text without geometry.
    fn extract_from_text(&self, text: &str) -> Result<DateCandidate>;
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use super::*;
    use crate::models::{ExtractionOutcome, MatchType};
    use crate::ocr::Rectangle;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn extractor() -> ExpirationExtractor {
        ExpirationExtractor::new().with_reference_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
    }

    fn fragment(text: &str, left: f32, top: f32, width: f32) -> TextFragment {
        TextFragment::new(text, Rectangle::new(left, top, width, 20.0))
    }

    #[test]
    fn test_inline_anchor() {
        let fragments = vec![fragment("SCAD: 12/05/2025", 10.0, 10.0, 200.0)];

        let candidate = extractor().extract(&fragments).unwrap();
        assert_eq!(candidate.formatted_date, "2025-05-12");
        assert_eq!(candidate.match_type, MatchType::Standard);
        assert_eq!(candidate.confidence, 0.95);
        assert_eq!(candidate.anchor_distance, Some(0.0));
    }

    #[test]
    fn test_anchor_with_date_to_the_right() {
        let fragments = vec![
            fragment("SCAD", 10.0, 10.0, 50.0),
            fragment("12 05 2025", 70.0, 10.0, 100.0),
        ];

        let candidate = extractor().extract(&fragments).unwrap();
        assert_eq!(candidate.formatted_date, "2025-05-12");
        assert_eq!(candidate.match_type, MatchType::Standard);
        assert_eq!(candidate.confidence, 1.0);
        assert_eq!(candidate.anchor_distance, Some(10.0));
    }

    #[test]
    fn test_anchor_with_date_below() {
        let fragments = vec![
            fragment("DA CONSUMARSI PREFERIBILMENTE ENTRO", 10.0, 10.0, 300.0),
            fragment("FINE: 08 2026", 10.0, 40.0, 120.0),
        ];

        let candidate = extractor().extract(&fragments).unwrap();
        assert_eq!(candidate.formatted_date, "2026-08-31");
        assert_eq!(candidate.match_type, MatchType::MonthYear);
    }

    #[test]
    fn test_sequence_without_anchor() {
        let fragments = vec![fragment("150125", 10.0, 10.0, 80.0)];

        let candidate = extractor().extract(&fragments).unwrap();
        assert_eq!(candidate.formatted_date, "2025-01-15");
        assert_eq!(candidate.match_type, MatchType::Sequence);
        assert_eq!(candidate.confidence, 0.71);
        assert_eq!(candidate.anchor_distance, None);
    }

    #[test]
    fn test_rejected_digit_runs_lower_confidence() {
        let fragments = vec![
            fragment("150125", 10.0, 10.0, 80.0),
            fragment("99887766", 10.0, 300.0, 80.0),
            fragment("123456", 10.0, 600.0, 80.0),
            fragment("777777", 10.0, 900.0, 80.0),
        ];

        let candidate = extractor().extract(&fragments).unwrap();
        assert_eq!(candidate.formatted_date, "2025-01-15");
        assert_eq!(candidate.confidence, 0.6);
    }

    #[test]
    fn test_no_date() {
        let fragments = vec![fragment("RANDOM TEXT 123", 10.0, 10.0, 150.0)];

        assert_eq!(extractor().extract(&fragments), Err(ExtractionError::NoMatchFound));

        let outcome = extractor().extract_outcome(&fragments);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("no date found"));
        assert_eq!(outcome.raw_text, "RANDOM TEXT 123");
    }

    #[test]
    fn test_partial_date() {
        let fragments = vec![fragment("30/08", 10.0, 10.0, 60.0)];

        let candidate = extractor().extract(&fragments).unwrap();
        assert_eq!(candidate.formatted_date, "2025-08-30");
        assert_eq!(candidate.match_type, MatchType::Partial);
        assert_eq!(candidate.confidence, 0.57);
    }

    #[test]
    fn test_month_year_resolves_to_month_end() {
        let candidate = extractor().extract_from_text("EXP 08/2026").unwrap();
        assert_eq!(candidate.formatted_date, "2026-08-31");
        assert_eq!(candidate.match_type, MatchType::MonthYear);
    }

    #[test]
    fn test_old_dates_are_rejected() {
        assert_eq!(
            extractor().extract_from_text("SCAD 12 MAG 2023"),
            Err(ExtractionError::AllCandidatesRejected)
        );
        // Within the one-year tolerance.
        assert_eq!(
            extractor().extract_from_text("SCAD 12 MAG 2024").unwrap().formatted_date,
            "2024-05-12"
        );
    }

    #[test]
    fn test_out_of_window_year_is_never_returned() {
        for text in [
            "SCAD 12/05/2019",
            "SCAD 12 05 2019",
            "SCAD 12 MAG 2019",
            "EXP 05/2019",
            "SCAD 12052019",
            "SCAD 12.052019",
        ] {
            assert_eq!(
                extractor().extract_from_text(text),
                Err(ExtractionError::AllCandidatesRejected),
                "{text}"
            );
        }
    }

    #[test]
    fn test_expired_full_date_is_not_reread_as_day_month() {
        assert_eq!(
            extractor().extract_from_text("SCAD 12/05/2023"),
            Err(ExtractionError::AllCandidatesRejected)
        );
    }

    #[test]
    fn test_sequence_beside_words() {
        for text in ["SCAD 150126", "EXP 15012026", "150126 L123"] {
            let candidate = extractor().extract_from_text(text).unwrap();
            assert_eq!(candidate.formatted_date, "2026-01-15", "{text}");
            assert_eq!(candidate.match_type, MatchType::Sequence, "{text}");
        }

        let inline = extractor().extract_from_text("SCAD 150126").unwrap();
        assert_eq!(inline.anchor_distance, Some(0.0));
    }

    #[test]
    fn test_empty_and_invalid_input() {
        assert_eq!(extractor().extract(&[]), Err(ExtractionError::NoMatchFound));
        assert_eq!(
            extractor().extract(&[fragment("   ", 0.0, 0.0, 10.0)]),
            Err(ExtractionError::NoMatchFound)
        );

        let broken = TextFragment::new("12/05/2025", Rectangle::new(0.0, 0.0, -5.0, 10.0));
        assert!(matches!(
            extractor().extract(&[broken]),
            Err(ExtractionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_progress_and_cancellation() {
        let fragments = vec![fragment("SCAD: 12/05/2025", 10.0, 10.0, 200.0)];

        let mut steps = Vec::new();
        let mut record = |step: ExtractionStep| {
            steps.push(step);
            ControlFlow::Continue(())
        };
        extractor().extract_with_progress(&fragments, &mut record).unwrap();
        assert_eq!(steps, ExtractionStep::ALL.to_vec());

        let mut cancel = |step: ExtractionStep| {
            if step == ExtractionStep::MatchingPatterns {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        assert_eq!(
            extractor().extract_with_progress(&fragments, &mut cancel),
            Err(ExtractionError::Cancelled)
        );
    }

    #[test]
    fn test_outcome_json() {
        let fragments = vec![fragment("SCAD: 12/05/2025", 10.0, 10.0, 200.0)];
        let outcome: ExtractionOutcome = extractor().extract_outcome(&fragments);

        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#"{"success":true,"extractedDate":"2025-05-12","confidence":0.95,"matchType":"standard","rawText":"SCAD: 12/05/2025"}"#
        );
        assert!(outcome.needs_confirmation(0.96));
        assert!(!outcome.needs_confirmation(0.9));
    }

    #[test]
    fn test_extractor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExpirationExtractor>();
    }
}
