//! Merging of overlapping candidates.

use std::cmp::Ordering;

use facefilter_models::{Detection, DetectionSet};

/// Any overlap merges two candidates.
pub const DEFAULT_CLUSTER_IOU: f64 = 0.0;

/// Greedily group overlapping candidates into one detection per cluster.
///
/// Candidates are visited by descending score. Each unassigned candidate
/// seeds a cluster that absorbs every later unassigned candidate whose IoU
/// with the seed exceeds `iou_threshold`. A cluster reports the averaged
/// center and scale and the summed score of its members.
pub fn cluster_detections(mut candidates: Vec<Detection>, iou_threshold: f64) -> DetectionSet {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut assigned = vec![false; candidates.len()];
    let mut clusters = Vec::new();

    for i in 0..candidates.len() {
        if assigned[i] {
            continue;
        }
        let seed = candidates[i];
        let (mut row, mut col, mut scale, mut n) = (0i64, 0i64, 0i64, 0i64);
        let mut score = 0.0f32;

        for j in i..candidates.len() {
            if assigned[j] {
                continue;
            }
            let det = candidates[j];
            if j == i || seed.iou(&det) > iou_threshold {
                assigned[j] = true;
                row += det.row as i64;
                col += det.col as i64;
                scale += det.scale as i64;
                score += det.score;
                n += 1;
            }
        }

        clusters.push(Detection::new(
            (row / n) as i32,
            (col / n) as i32,
            (scale / n) as i32,
            score,
        ));
    }

    DetectionSet::new(clusters)
}
