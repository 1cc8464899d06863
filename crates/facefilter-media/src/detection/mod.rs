//! Object detection seam.
//!
//! A [`Detector`] turns one frame into raw, possibly overlapping candidates.
//! [`cluster_detections`] merges overlapping candidates and
//! [`DetectionStage`] applies the score threshold afterwards, so a
//! low-scoring candidate can still contribute to a strong cluster.

mod cascade;
mod cluster;
mod stage;

pub use cascade::{PicoCascade, ScanParams};
pub use cluster::{cluster_detections, DEFAULT_CLUSTER_IOU};
pub use stage::DetectionStage;

use facefilter_models::{Detection, Frame};

/// Pluggable detection backend.
///
/// Implementations are immutable once constructed and shared across the run.
pub trait Detector: Send + Sync {
    /// Raw candidates for `frame`, before clustering and thresholding.
    fn candidates(&self, frame: &Frame) -> Vec<Detection>;
}
