//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid geometry {width}x{height}: width and height must be positive")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Geometry {width}x{height} overflows the addressable frame size")]
    GeometryOverflow { width: u32, height: u32 },

    #[error("Frame buffer has {actual} bytes, geometry requires {expected}")]
    BufferLength { expected: usize, actual: usize },
}
