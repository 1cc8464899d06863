//! Detection results.

use serde::{Deserialize, Serialize};

/// One candidate object location produced by the classifier.
///
/// `row`/`col` are the center in pixel coordinates of the frame the
/// detection came from; `scale` is the side of the square region and
/// `score` an unbounded confidence value (may be negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub row: i32,
    pub col: i32,
    pub scale: i32,
    pub score: f32,
}

impl Detection {
    pub fn new(row: i32, col: i32, scale: i32, score: f32) -> Self {
        Self {
            row,
            col,
            scale,
            score,
        }
    }

    /// Half-extent of the outline drawn for this detection.
    #[inline]
    pub fn radius(&self) -> i32 {
        self.scale / 2
    }

    /// Whether this detection clears `min_score` (inclusive).
    #[inline]
    pub fn passes(&self, min_score: f32) -> bool {
        self.score >= min_score
    }

    /// Intersection-over-union of the square regions of two detections.
    pub fn iou(&self, other: &Detection) -> f64 {
        let (r1, c1, s1) = (self.row as f64, self.col as f64, self.scale as f64);
        let (r2, c2, s2) = (other.row as f64, other.col as f64, other.scale as f64);

        let over_row = ((r1 + s1 / 2.0).min(r2 + s2 / 2.0) - (r1 - s1 / 2.0).max(r2 - s2 / 2.0)).max(0.0);
        let over_col = ((c1 + s1 / 2.0).min(c2 + s2 / 2.0) - (c1 - s1 / 2.0).max(c2 - s2 / 2.0)).max(0.0);

        let intersection = over_row * over_col;
        let union = s1 * s1 + s2 * s2 - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Detections from one pass over one frame, in clustering-output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Drop every detection scoring below `min_score`, preserving order.
    pub fn retain_above(mut self, min_score: f32) -> Self {
        self.detections.retain(|det| det.passes(min_score));
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn as_slice(&self) -> &[Detection] {
        &self.detections
    }
}

impl From<Vec<Detection>> for DetectionSet {
    fn from(detections: Vec<Detection>) -> Self {
        Self::new(detections)
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_is_half_scale() {
        assert_eq!(Detection::new(1, 2, 4, 10.0).radius(), 2);
        assert_eq!(Detection::new(1, 2, 5, 10.0).radius(), 2);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let set = DetectionSet::new(vec![
            Detection::new(0, 0, 10, 4.99),
            Detection::new(0, 0, 10, 5.0),
            Detection::new(0, 0, 10, -1.0),
            Detection::new(0, 0, 10, 12.5),
        ])
        .retain_above(5.0);

        let scores: Vec<f32> = set.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![5.0, 12.5]);
    }

    #[test]
    fn test_iou() {
        let a = Detection::new(10, 10, 10, 1.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);

        let far = Detection::new(100, 100, 10, 1.0);
        assert_eq!(a.iou(&far), 0.0);

        // Half overlap along columns: 10x5 intersection, 200 - 50 union.
        let shifted = Detection::new(10, 15, 10, 1.0);
        assert!((a.iou(&shifted) - 50.0 / 150.0).abs() < 1e-9);
    }
}
