//! Shared data models for the face filter.
//!
//! This crate provides Serde-serializable types for:
//! - Frame geometry (fixed for a whole run)
//! - Reusable grayscale frame buffers
//! - Detections and per-frame detection sets

pub mod detection;
pub mod error;
pub mod frame;
pub mod geometry;

// Re-export common types
pub use detection::{Detection, DetectionSet};
pub use error::{ModelError, ModelResult};
pub use frame::Frame;
pub use geometry::Geometry;
