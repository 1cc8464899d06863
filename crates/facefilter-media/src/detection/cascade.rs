//! Pixel-intensity-comparison cascade backend.
//!
//! Reads the packed binary cascade format of the `facefinder` classifier:
//!
//! ```text
//! [8 bytes reserved]
//! [i32 LE tree depth d] [i32 LE tree count n]
//! n x ( [4 * 2^d - 4 signed bytes of node codes]
//!       [2^d f32 LE leaf predictions]
//!       [f32 LE threshold] )
//! ```
//!
//! Every inner node compares two pixel intensities at offsets (in 1/256ths
//! of the region scale) from the region center.

use facefilter_models::{Detection, Frame};
use tracing::debug;

use super::Detector;
use crate::error::{MediaError, MediaResult};

const HEADER_SKIP: usize = 8;
const MAX_TREE_DEPTH: i32 = 16;

/// Region scan parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    /// Smallest region side in pixels.
    pub min_size: i32,
    /// Largest region side in pixels.
    pub max_size: i32,
    /// Step between region centers as a fraction of the region side.
    pub shift_factor: f64,
    /// Growth factor between scales.
    pub scale_factor: f64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            min_size: 100,
            max_size: 600,
            shift_factor: 0.15,
            scale_factor: 1.1,
        }
    }
}

/// Unpacked cascade plus its scan parameters. Immutable after construction.
#[derive(Debug, Clone)]
pub struct PicoCascade {
    tree_depth: u32,
    tree_count: usize,
    codes: Vec<i8>,
    predictions: Vec<f32>,
    thresholds: Vec<f32>,
    params: ScanParams,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> MediaResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                MediaError::unpack(format!(
                    "truncated while reading {} at byte {} ({} bytes total)",
                    what,
                    self.pos,
                    self.data.len()
                ))
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn i32(&mut self, what: &str) -> MediaResult<i32> {
        let b = self.take(4, what)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self, what: &str) -> MediaResult<f32> {
        let b = self.take(4, what)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl PicoCascade {
    /// Unpack a cascade blob.
    pub fn unpack(data: &[u8]) -> MediaResult<Self> {
        let mut cursor = Cursor { data, pos: 0 };
        cursor.take(HEADER_SKIP, "header")?;

        let depth = cursor.i32("tree depth")?;
        if depth <= 0 || depth > MAX_TREE_DEPTH {
            return Err(MediaError::unpack(format!("invalid tree depth {}", depth)));
        }
        let count = cursor.i32("tree count")?;
        if count < 0 {
            return Err(MediaError::unpack(format!("invalid tree count {}", count)));
        }

        let tree_depth = depth as u32;
        let tree_count = count as usize;
        let leaves = 1usize << tree_depth;

        let mut codes = Vec::with_capacity(tree_count * 4 * leaves);
        let mut predictions = Vec::with_capacity(tree_count * leaves);
        let mut thresholds = Vec::with_capacity(tree_count);

        for _ in 0..tree_count {
            // Node 0 is unused; keep it so node `i` lives at `4 * i`.
            codes.extend_from_slice(&[0; 4]);
            codes.extend(
                cursor
                    .take(4 * leaves - 4, "node codes")?
                    .iter()
                    .map(|&b| b as i8),
            );
            for _ in 0..leaves {
                predictions.push(cursor.f32("leaf prediction")?);
            }
            thresholds.push(cursor.f32("tree threshold")?);
        }

        debug!(tree_depth, tree_count, bytes = data.len(), "Unpacked cascade");

        Ok(Self {
            tree_depth,
            tree_count,
            codes,
            predictions,
            thresholds,
            params: ScanParams::default(),
        })
    }

    pub fn with_params(mut self, params: ScanParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> ScanParams {
        self.params
    }

    pub fn tree_depth(&self) -> u32 {
        self.tree_depth
    }

    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    /// Score the square region of side `scale` centered at `(row, col)`.
    /// Negative means rejected.
    pub fn classify_region(&self, frame: &Frame, row: i32, col: i32, scale: i32) -> f32 {
        if self.tree_count == 0 {
            return 0.0;
        }

        let leaves = 1usize << self.tree_depth;
        let (r, c) = (row.saturating_mul(256), col.saturating_mul(256));
        let mut root = 0usize;
        let mut out = 0.0f32;

        for tree in 0..self.tree_count {
            let mut idx = 1usize;
            for _ in 0..self.tree_depth {
                let code = |k: usize| self.codes[root + 4 * idx + k] as i32;
                let r1 = (r + code(0) * scale) >> 8;
                let c1 = (c + code(1) * scale) >> 8;
                let r2 = (r + code(2) * scale) >> 8;
                let c2 = (c + code(3) * scale) >> 8;
                let brighter = luminance(frame, r1, c1) <= luminance(frame, r2, c2);
                idx = 2 * idx + brighter as usize;
            }

            out += self.predictions[leaves * tree + idx - leaves];
            if out <= self.thresholds[tree] {
                return -1.0;
            }
            root += 4 * leaves;
        }

        out - self.thresholds[self.tree_count - 1]
    }
}

/// Pixel lookup clamped to the frame.
fn luminance(frame: &Frame, row: i32, col: i32) -> u8 {
    let row = row.clamp(0, frame.height() as i32 - 1) as u32;
    let col = col.clamp(0, frame.width() as i32 - 1) as u32;
    frame.pixel(col, row).unwrap_or(0)
}

impl Detector for PicoCascade {
    fn candidates(&self, frame: &Frame) -> Vec<Detection> {
        let params = self.params;
        let rows = frame.height().min(i32::MAX as u32) as i32;
        let cols = frame.width().min(i32::MAX as u32) as i32;
        let mut detections = Vec::new();

        let mut scale = params.min_size.max(1);
        while scale <= params.max_size {
            let step = ((params.shift_factor * scale as f64) as i32).max(1);
            let offset = scale / 2 + 1;

            let mut row = offset;
            while row <= rows - offset {
                let mut col = offset;
                while col <= cols - offset {
                    let score = self.classify_region(frame, row, col, scale);
                    if score > 0.0 {
                        detections.push(Detection::new(row, col, scale, score));
                    }
                    col += step;
                }
                row += step;
            }

            scale = ((scale as f64 * params.scale_factor) as i32).max(scale + 1);
        }

        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::cluster_detections;
    use facefilter_models::Geometry;

    /// Depth-1 cascade with one tree whose single node compares the pixel
    /// at `a` against the pixel at `b` (row, col offsets in 1/256ths).
    fn single_node_blob(a: (i8, i8), b: (i8, i8), preds: [f32; 2], threshold: f32) -> Vec<u8> {
        let mut blob = vec![0u8; 8];
        blob.extend_from_slice(&1i32.to_le_bytes());
        blob.extend_from_slice(&1i32.to_le_bytes());
        blob.extend_from_slice(&[a.0 as u8, a.1 as u8, b.0 as u8, b.1 as u8]);
        for p in preds {
            blob.extend_from_slice(&p.to_le_bytes());
        }
        blob.extend_from_slice(&threshold.to_le_bytes());
        blob
    }

    #[test]
    fn test_unpack_header() {
        let cascade = PicoCascade::unpack(&single_node_blob((0, 0), (0, 0), [-1.0, 2.0], 0.5)).unwrap();
        assert_eq!(cascade.tree_depth(), 1);
        assert_eq!(cascade.tree_count(), 1);
        assert_eq!(cascade.params(), ScanParams::default());
    }

    #[test]
    fn test_unpack_rejects_truncated_blob() {
        let mut blob = single_node_blob((0, 0), (0, 0), [-1.0, 2.0], 0.5);
        blob.truncate(blob.len() - 1);
        let err = PicoCascade::unpack(&blob).unwrap_err();
        assert!(err.to_string().contains("tree threshold"));

        assert!(PicoCascade::unpack(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_unpack_rejects_bad_depth() {
        let mut blob = vec![0u8; 8];
        blob.extend_from_slice(&0i32.to_le_bytes());
        blob.extend_from_slice(&1i32.to_le_bytes());
        assert!(PicoCascade::unpack(&blob).is_err());
    }

    #[test]
    fn test_classify_compares_pixels() {
        // Compare left half (col offset -64) against right half (+64).
        let cascade =
            PicoCascade::unpack(&single_node_blob((0, -64), (0, 64), [3.0, -3.0], 0.0)).unwrap();

        let geometry = Geometry::new(20, 20).unwrap();
        let mut pixels = vec![0u8; 400];
        for row in 0..20 {
            for col in 0..10 {
                pixels[row * 20 + col] = 200;
            }
        }
        let frame = Frame::from_vec(geometry, pixels).unwrap();

        // Left brighter than right: left <= right is false, leaf 0 scores 3.0.
        assert_eq!(cascade.classify_region(&frame, 10, 10, 16), 3.0);

        let flat = Frame::new(geometry);
        assert_eq!(cascade.classify_region(&flat, 10, 10, 16), -1.0);
    }

    #[test]
    fn test_scan_then_cluster() {
        let cascade = PicoCascade::unpack(&single_node_blob((0, 0), (0, 0), [-1.0, 2.0], 0.5))
            .unwrap()
            .with_params(ScanParams {
                min_size: 10,
                max_size: 10,
                shift_factor: 0.15,
                scale_factor: 1.1,
            });
        let frame = Frame::new(Geometry::new(20, 20).unwrap());

        let candidates = cascade.candidates(&frame);
        // Centers 6..=14 on both axes with a step of 1.
        assert_eq!(candidates.len(), 81);
        assert!(candidates.iter().all(|d| d.scale == 10 && d.score == 1.5));

        let clusters = cluster_detections(candidates, 0.0);
        assert_eq!(clusters.len(), 1);
        let det = clusters.as_slice()[0];
        assert_eq!((det.row, det.col, det.scale), (10, 10, 10));
        assert!((det.score - 121.5).abs() < 1e-3);
    }

    #[test]
    fn test_frame_smaller_than_min_size() {
        let cascade = PicoCascade::unpack(&single_node_blob((0, 0), (0, 0), [-1.0, 2.0], 0.5)).unwrap();
        let frame = Frame::new(Geometry::new(4, 2).unwrap());
        assert!(cascade.candidates(&frame).is_empty());
    }
}
