//! Detection of expiration label fragments ("SCAD", "EXP", "BEST BEFORE", ...).

use lazy_static::lazy_static;

use super::is_word_char;
use crate::models::config::DEFAULT_ANCHOR_KEYWORDS;

lazy_static! {
    static ref DEFAULT_DETECTOR: AnchorDetector = AnchorDetector::new(DEFAULT_ANCHOR_KEYWORDS);
}

/// Whether `text` labels an expiration date, using the built-in keyword list.
pub fn is_expiration_anchor(text: &str) -> bool {
    DEFAULT_DETECTOR.is_expiration_anchor(text)
}

/// Classifies fragments as expiration anchors.
#[derive(Debug, Clone)]
pub struct AnchorDetector {
    keywords: Vec<Keyword>,
}

#[derive(Debug, Clone)]
enum Keyword {
    /// Long keywords match anywhere in the text.
    Substring(String),
    /// Short keywords ("BB", "DA") must stand alone as a word.
    Word(String),
}

impl AnchorDetector {
    /// Keywords of up to three characters require word boundaries.
    const SHORT_KEYWORD_LEN: usize = 3;

    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_uppercase())
            .filter(|k| !k.is_empty())
            .map(|k| {
                if k.chars().count() > Self::SHORT_KEYWORD_LEN {
                    Keyword::Substring(k)
                } else {
                    Keyword::Word(k)
                }
            })
            .collect();

        Self { keywords }
    }

    /// Whether `text` contains one of the configured keywords.
    pub fn is_expiration_anchor(&self, text: &str) -> bool {
        if text.chars().count() < 2 {
            return false;
        }

        let upper = text.to_uppercase();
        self.keywords.iter().any(|keyword| match keyword {
            Keyword::Substring(k) => upper.contains(k.as_str()),
            Keyword::Word(k) => contains_word(&upper, k),
        })
    }
}

impl Default for AnchorDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR_KEYWORDS)
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}
