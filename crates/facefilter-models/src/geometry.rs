//! Frame geometry.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Width and height of every frame in a run.
///
/// Supplied by configuration and never inferred from the stream. Frames are
/// GRAY8, so one pixel is one byte and a frame is exactly `width * height`
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    width: u32,
    height: u32,
}

impl Geometry {
    /// Create a geometry, rejecting zero dimensions and sizes that do not fit
    /// in memory.
    pub fn new(width: u32, height: u32) -> ModelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ModelError::InvalidGeometry { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .ok_or(ModelError::GeometryOverflow { width, height })?;
        Ok(Self { width, height })
    }

    /// Pixel columns.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        let geometry = Geometry::new(640, 480).unwrap();
        assert_eq!(geometry.frame_len(), 307_200);
        assert_eq!(geometry.to_string(), "640x480");
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert_eq!(
            Geometry::new(0, 480),
            Err(ModelError::InvalidGeometry {
                width: 0,
                height: 480
            })
        );
        assert!(Geometry::new(640, 0).is_err());
    }

    #[test]
    fn test_serde_shape() {
        let geometry = Geometry::new(4, 2).unwrap();
        let json = serde_json::to_string(&geometry).unwrap();
        assert_eq!(json, r#"{"width":4,"height":2}"#);
    }
}
