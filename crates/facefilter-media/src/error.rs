//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while streaming frames or running the pipeline.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Launcher not found in PATH: {0}")]
    LauncherNotFound(String),

    #[error("Failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline command is empty")]
    EmptyCommand,

    #[error("Failed to capture stdout of {0}")]
    StdoutUnavailable(String),

    #[error("Short read on frame {frame}: got {received} of {expected} bytes")]
    ShortRead {
        frame: u64,
        expected: usize,
        received: usize,
    },

    #[error("Short write on frame {frame}: {expected} bytes could not be written")]
    ShortWrite { frame: u64, expected: usize },

    #[error("Frame geometry {actual} does not match stream geometry {expected}")]
    GeometryMismatch { expected: String, actual: String },

    #[error("Error reading the cascade file {path}: {source}")]
    ClassifierRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error unpacking the cascade file: {0}")]
    ClassifierUnpack(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a cascade unpack error.
    pub fn unpack(message: impl Into<String>) -> Self {
        Self::ClassifierUnpack(message.into())
    }

    /// Whether this error breaks frame alignment on the stream.
    pub fn is_framing(&self) -> bool {
        matches!(self, MediaError::ShortRead { .. } | MediaError::ShortWrite { .. })
    }
}
