//! Spatial relations between fragment rectangles.
//!
//! Used to decide which fragment on a label belongs to a detected anchor.
//! Everything here is a pure function of its inputs.

use super::Rectangle;
use crate::models::config::GeometryConfig;

/// Minimum distance between two rectangles.
///
/// 0 when they intersect, the axis-aligned gap when they overlap on one axis,
/// otherwise the corner-to-corner distance.
pub fn distance(a: &Rectangle, b: &Rectangle) -> f32 {
    let x_overlap = a.horizontal_overlap(b);
    let y_overlap = a.vertical_overlap(b);

    let dx = if a.left < b.left {
        b.left - a.right()
    } else {
        a.left - b.right()
    }
    .max(0.0);
    let dy = if a.top < b.top {
        b.top - a.bottom()
    } else {
        a.top - b.bottom()
    }
    .max(0.0);

    match (x_overlap > 0.0, y_overlap > 0.0) {
        (true, true) => 0.0,
        (true, false) => dy,
        (false, true) => dx,
        (false, false) => (dx * dx + dy * dy).sqrt(),
    }
}

/// `target` starts right of `anchor` on roughly the same line.
///
/// `tolerance_pct` bounds the vertical center offset as a share of the
/// average height.
pub fn is_right_of(anchor: &Rectangle, target: &Rectangle, tolerance_pct: f32) -> bool {
    let avg_height = (anchor.height + target.height) / 2.0;
    let vertical_diff = (anchor.center_y() - target.center_y()).abs();

    target.left > anchor.left && vertical_diff <= avg_height * tolerance_pct
}

/// `target` is below `anchor` and shares its column.
///
/// The horizontal overlap must exceed `tolerance_pct` of the narrower width.
pub fn is_below(anchor: &Rectangle, target: &Rectangle, tolerance_pct: f32) -> bool {
    target.top > anchor.top && shares_column(anchor, target, tolerance_pct)
}

/// `target` is above `anchor` and shares its column (date printed over the label).
pub fn is_above(anchor: &Rectangle, target: &Rectangle, tolerance_pct: f32) -> bool {
    target.top < anchor.top && shares_column(anchor, target, tolerance_pct)
}

fn shares_column(anchor: &Rectangle, target: &Rectangle, tolerance_pct: f32) -> bool {
    let min_width = anchor.width.min(target.width);
    anchor.horizontal_overlap(target) > min_width * tolerance_pct
}

/// Direction in which a fragment sits relative to an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    RightOf,
    Below,
    Above,
}

/// Applies configured tolerances to the relation functions.
#[derive(Debug, Clone)]
pub struct GeometricRelator {
    right_of_tolerance: f32,
    below_tolerance: f32,
    above_tolerance: f32,
    max_link_distance: f32,
}

impl GeometricRelator {
    pub fn new(config: &GeometryConfig) -> Self {
        Self {
            right_of_tolerance: config.right_of_tolerance,
            below_tolerance: config.below_tolerance,
            above_tolerance: config.above_tolerance,
            max_link_distance: config.max_link_distance,
        }
    }

    /// Relation of `target` to `anchor`, right-of taking precedence.
    pub fn relation(&self, anchor: &Rectangle, target: &Rectangle) -> Option<Relation> {
        if is_right_of(anchor, target, self.right_of_tolerance) {
            Some(Relation::RightOf)
        } else if is_below(anchor, target, self.below_tolerance) {
            Some(Relation::Below)
        } else if is_above(anchor, target, self.above_tolerance) {
            Some(Relation::Above)
        } else {
            None
        }
    }

    /// Distance and relation when `target` can be linked to `anchor`.
    pub fn link(&self, anchor: &Rectangle, target: &Rectangle) -> Option<(Relation, f32)> {
        let dist = distance(anchor, target);
        if dist > self.max_link_distance {
            return None;
        }
        self.relation(anchor, target).map(|r| (r, dist))
    }
}

impl Default for GeometricRelator {
    fn default() -> Self {
        Self::new(&GeometryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f32, top: f32, width: f32, height: f32) -> Rectangle {
        Rectangle::new(left, top, width, height)
    }

    #[test]
    fn test_distance_cases() {
        let a = rect(0.0, 0.0, 10.0, 10.0);

        assert_eq!(distance(&a, &rect(5.0, 5.0, 10.0, 10.0)), 0.0);
        // Same row, 20 apart.
        assert_eq!(distance(&a, &rect(30.0, 0.0, 10.0, 10.0)), 20.0);
        // Same column, 5 apart.
        assert_eq!(distance(&a, &rect(0.0, 15.0, 10.0, 10.0)), 5.0);
        // Diagonal: 3-4-5 triangle.
        assert_eq!(distance(&a, &rect(13.0, 14.0, 10.0, 10.0)), 5.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let rects = [
            rect(0.0, 0.0, 10.0, 10.0),
            rect(30.0, 0.0, 10.0, 10.0),
            rect(13.0, 14.0, 10.0, 10.0),
            rect(-50.0, 80.0, 5.0, 2.0),
            rect(4.0, 4.0, 0.0, 0.0),
        ];
        for a in &rects {
            for b in &rects {
                assert_eq!(distance(a, b), distance(b, a));
            }
        }
    }

    #[test]
    fn test_right_of_is_directional() {
        let anchor = rect(10.0, 10.0, 30.0, 20.0);
        let date = rect(50.0, 10.0, 80.0, 20.0);

        assert!(is_right_of(&anchor, &date, 0.5));
        assert!(!is_right_of(&date, &anchor, 0.5));
        // Different line.
        assert!(!is_right_of(&anchor, &rect(50.0, 40.0, 80.0, 20.0), 0.5));
    }

    #[test]
    fn test_below_and_above() {
        let anchor = rect(10.0, 10.0, 50.0, 20.0);
        let below = rect(10.0, 40.0, 80.0, 20.0);

        assert!(is_below(&anchor, &below, 0.8));
        assert!(!is_above(&anchor, &below, 0.8));
        assert!(is_above(&below, &anchor, 0.8));
        // Overlap of 20 on a min width of 50 is too little.
        assert!(!is_below(&anchor, &rect(40.0, 40.0, 80.0, 20.0), 0.8));
    }

    #[test]
    fn test_link_respects_max_distance() {
        let relator = GeometricRelator::default();
        let anchor = rect(10.0, 10.0, 50.0, 20.0);

        assert_eq!(
            relator.link(&anchor, &rect(10.0, 40.0, 80.0, 20.0)),
            Some((Relation::Below, 10.0))
        );
        assert_eq!(relator.link(&anchor, &rect(10.0, 500.0, 80.0, 20.0)), None);
    }
}
