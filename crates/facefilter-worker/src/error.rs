//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Classifier already loaded from {loaded}, refusing to load {requested}")]
    ClassifierConflict { loaded: PathBuf, requested: PathBuf },

    #[error("Metrics setup failed: {0}")]
    MetricsFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] facefilter_media::MediaError),

    #[error("Model error: {0}")]
    Model(#[from] facefilter_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn metrics_failed(msg: impl Into<String>) -> Self {
        Self::MetricsFailed(msg.into())
    }

    /// Process exit code for this error. Never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkerError::ConfigError(_) | WorkerError::Model(_) => 2,
            _ => 1,
        }
    }

    /// Whether the error broke frame alignment on a stream.
    pub fn is_framing(&self) -> bool {
        matches!(self, WorkerError::Media(e) if e.is_framing())
    }
}
