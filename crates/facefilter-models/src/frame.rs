//! Reusable GRAY8 frame buffer.

use crate::error::{ModelError, ModelResult};
use crate::geometry::Geometry;

/// One raw grayscale frame: `width * height` bytes, row-major, no padding.
///
/// A single frame is allocated before the processing loop and overwritten on
/// every read, so its contents are only meaningful for the iteration that
/// filled it. The length always equals `geometry.frame_len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    geometry: Geometry,
    data: Vec<u8>,
}

impl Frame {
    /// Allocate a zeroed frame for `geometry`.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            data: vec![0; geometry.frame_len()],
        }
    }

    /// Wrap an existing buffer, which must match the geometry exactly.
    pub fn from_vec(geometry: Geometry, data: Vec<u8>) -> ModelResult<Self> {
        if data.len() != geometry.frame_len() {
            return Err(ModelError::BufferLength {
                expected: geometry.frame_len(),
                actual: data.len(),
            });
        }
        Ok(Self { geometry, data })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn width(&self) -> u32 {
        self.geometry.width()
    }

    pub fn height(&self) -> u32 {
        self.geometry.height()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable pixel access. The slice cannot be resized, which keeps the
    /// length invariant intact.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Intensity at `(col, row)`, or `None` outside the frame.
    pub fn pixel(&self, col: u32, row: u32) -> Option<u8> {
        if col >= self.width() || row >= self.height() {
            return None;
        }
        self.data
            .get(row as usize * self.width() as usize + col as usize)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_zeroed() {
        let frame = Frame::new(Geometry::new(4, 2).unwrap());
        assert_eq!(frame.len(), 8);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_vec_checks_length() {
        let geometry = Geometry::new(4, 2).unwrap();
        let err = Frame::from_vec(geometry, vec![0; 7]).unwrap_err();
        assert_eq!(
            err,
            ModelError::BufferLength {
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn test_pixel_is_row_major() {
        let geometry = Geometry::new(3, 2).unwrap();
        let frame = Frame::from_vec(geometry, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(frame.pixel(2, 0), Some(2));
        assert_eq!(frame.pixel(0, 1), Some(3));
        assert_eq!(frame.pixel(3, 0), None);
        assert_eq!(frame.pixel(0, 2), None);
    }
}
