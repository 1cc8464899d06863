//! Detection, clustering and score threshold for one frame.

use std::sync::Arc;

use facefilter_models::{DetectionSet, Frame};

use super::cluster::{cluster_detections, DEFAULT_CLUSTER_IOU};
use super::Detector;

/// Per-frame detection pass with a post-clustering score threshold.
#[derive(Clone)]
pub struct DetectionStage {
    detector: Arc<dyn Detector>,
    iou_threshold: f64,
    min_score: f32,
}

impl DetectionStage {
    pub fn new(detector: Arc<dyn Detector>, min_score: f32) -> Self {
        Self {
            detector,
            iou_threshold: DEFAULT_CLUSTER_IOU,
            min_score,
        }
    }

    /// Detections on `frame` scoring at least `min_score`.
    pub fn run(&self, frame: &Frame) -> DetectionSet {
        let candidates = self.detector.candidates(frame);
        cluster_detections(candidates, self.iou_threshold).retain_above(self.min_score)
    }
}

impl std::fmt::Debug for DetectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionStage")
            .field("iou_threshold", &self.iou_threshold)
            .field("min_score", &self.min_score)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facefilter_models::{Detection, Geometry};

    struct Fixed(Vec<Detection>);

    impl Detector for Fixed {
        fn candidates(&self, _frame: &Frame) -> Vec<Detection> {
            self.0.clone()
        }
    }

    #[test]
    fn test_threshold_applies_after_clustering() {
        // Neither candidate clears 5.0 alone; their merged cluster does.
        let detector = Fixed(vec![
            Detection::new(50, 50, 20, 3.0),
            Detection::new(52, 50, 20, 3.0),
            Detection::new(200, 200, 20, 4.0),
        ]);
        let stage = DetectionStage::new(Arc::new(detector), 5.0);
        let frame = Frame::new(Geometry::new(320, 240).unwrap());

        let set = stage.run(&frame);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0], Detection::new(51, 50, 20, 6.0));
    }
}
