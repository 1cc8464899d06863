#![deny(unreachable_patterns)]
//! Frame streaming and media pipeline plumbing.
//!
//! This crate provides:
//! - Exact-length GRAY8 frame reads and writes over async byte streams
//! - In-place outline annotation of detections
//! - Launching and supervising an external media pipeline process
//! - Cooperative cancellation shared by the loop and the supervisor
//! - The detector seam, clustering and the bundled cascade backend

pub mod annotate;
pub mod cancel;
pub mod codec;
pub mod command;
pub mod detection;
pub mod error;
pub mod supervisor;

pub use annotate::{annotate, draw_outline, OUTLINE_BOOST};
pub use cancel::{CancelToken, CancellationController};
pub use codec::{FrameReader, FrameWriter, ReadOutcome};
pub use command::{split_args, PipelineCommand};
pub use detection::{
    cluster_detections, DetectionStage, Detector, PicoCascade, ScanParams,
    DEFAULT_CLUSTER_IOU,
};
pub use error::{MediaError, MediaResult};
pub use supervisor::{ChildExit, PipelineProcess};
