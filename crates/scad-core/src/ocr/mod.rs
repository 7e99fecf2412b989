//! OCR fragment types and the text/geometry helpers that work on them.
//!
//! The recognizer itself lives outside this crate; it hands over
//! [`TextFragment`]s, each carrying the recognized text and its frame.

mod anchors;
mod geometry;
mod preprocessing;

pub use anchors::{is_expiration_anchor, AnchorDetector};
pub use geometry::{distance, is_above, is_below, is_right_of, GeometricRelator, Relation};
pub use preprocessing::clean_fragment_text;

pub(crate) use preprocessing::is_word_char;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle of a fragment.
///
/// Units are image pixels or normalized 0..1, as long as one pass is consistent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Vertical center.
    pub fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }

    /// Length of the shared horizontal span (0 when disjoint).
    pub fn horizontal_overlap(&self, other: &Rectangle) -> f32 {
        (self.right().min(other.right()) - self.left.max(other.left)).max(0.0)
    }

    /// Length of the shared vertical span (0 when disjoint).
    pub fn vertical_overlap(&self, other: &Rectangle) -> f32 {
        (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0)
    }

    /// Finite coordinates and non-negative size.
    pub fn is_well_formed(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// One OCR-recognized text span with its bounding rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Recognized text content.
    pub text: String,

    /// Bounding rectangle.
    pub frame: Rectangle,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, frame: Rectangle) -> Self {
        Self {
            text: text.into(),
            frame,
        }
    }

    /// Whether the fragment carries no usable text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Join fragment texts the way the UI shows raw OCR output.
pub fn raw_text(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps() {
        let a = Rectangle::new(0.0, 0.0, 100.0, 20.0);
        let b = Rectangle::new(50.0, 10.0, 100.0, 20.0);

        assert_eq!(a.horizontal_overlap(&b), 50.0);
        assert_eq!(a.vertical_overlap(&b), 10.0);
        assert_eq!(a.horizontal_overlap(&Rectangle::new(300.0, 0.0, 10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_well_formed() {
        assert!(Rectangle::new(0.0, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!Rectangle::new(0.0, 0.0, -1.0, 1.0).is_well_formed());
        assert!(!Rectangle::new(f32::NAN, 0.0, 1.0, 1.0).is_well_formed());
    }

    #[test]
    fn test_fragment_json_shape() {
        let json = r#"{"text":"SCAD","frame":{"left":1,"top":2,"width":3,"height":4}}"#;
        let fragment: TextFragment = serde_json::from_str(json).unwrap();

        assert_eq!(fragment.frame, Rectangle::new(1.0, 2.0, 3.0, 4.0));
        assert!(!fragment.is_blank());
        assert!(TextFragment::new(" \n", fragment.frame).is_blank());
    }
}
