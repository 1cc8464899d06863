//! Process-wide run state: the classifier and the cancellation flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use facefilter_media::{CancelToken, CancellationController, Detector, MediaError, PicoCascade};
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

struct LoadedClassifier {
    path: PathBuf,
    detector: Arc<dyn Detector>,
}

/// Owns the classifier (loaded at most once, read-only afterwards) and the
/// cancellation controller. Frame counters live in the loop, not here.
pub struct RunState {
    classifier: OnceCell<LoadedClassifier>,
    cancellation: CancellationController,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            classifier: OnceCell::new(),
            cancellation: CancellationController::new(),
        }
    }

    /// Run state with an already constructed detector registered under `path`.
    pub fn with_detector(path: impl Into<PathBuf>, detector: Arc<dyn Detector>) -> Self {
        Self {
            classifier: OnceCell::new_with(Some(LoadedClassifier {
                path: path.into(),
                detector,
            })),
            cancellation: CancellationController::new(),
        }
    }

    /// Load and unpack the cascade at `path` on first call; later calls with
    /// the same path return the cached detector without touching the disk.
    pub async fn load_classifier(&self, path: &Path) -> WorkerResult<Arc<dyn Detector>> {
        let loaded = self
            .classifier
            .get_or_try_init(|| async {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|source| MediaError::ClassifierRead {
                        path: path.to_path_buf(),
                        source,
                    })?;
                let cascade = PicoCascade::unpack(&data)?;
                info!(
                    path = %path.display(),
                    trees = cascade.tree_count(),
                    depth = cascade.tree_depth(),
                    "Loaded cascade"
                );
                Ok::<_, WorkerError>(LoadedClassifier {
                    path: path.to_path_buf(),
                    detector: Arc::new(cascade),
                })
            })
            .await?;

        if loaded.path != path {
            return Err(WorkerError::ClassifierConflict {
                loaded: loaded.path.clone(),
                requested: path.to_path_buf(),
            });
        }

        Ok(Arc::clone(&loaded.detector))
    }

    pub fn is_classifier_loaded(&self) -> bool {
        self.classifier.initialized()
    }

    pub fn cancellation(&self) -> &CancellationController {
        &self.cancellation
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancellation.token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cascade_blob() -> Vec<u8> {
        let mut blob = vec![0u8; 8];
        blob.extend_from_slice(&1i32.to_le_bytes());
        blob.extend_from_slice(&1i32.to_le_bytes());
        blob.extend_from_slice(&[0, 0, 0, 0]);
        blob.extend_from_slice(&(-1.0f32).to_le_bytes());
        blob.extend_from_slice(&2.0f32.to_le_bytes());
        blob.extend_from_slice(&0.5f32.to_le_bytes());
        blob
    }

    #[tokio::test]
    async fn test_loads_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&cascade_blob()).unwrap();

        let state = RunState::new();
        assert!(!state.is_classifier_loaded());

        let first = state.load_classifier(file.path()).await.unwrap();
        // Removing the file proves the second call is served from the cache.
        let path = file.path().to_path_buf();
        file.close().unwrap();
        let second = state.load_classifier(&path).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(state.is_classifier_loaded());
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let state = RunState::new();
        let err = state
            .load_classifier(Path::new("/nonexistent/cascade/facefinder"))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            WorkerError::Media(MediaError::ClassifierRead { .. })
        ));
        assert!(!state.is_classifier_loaded());
    }

    #[tokio::test]
    async fn test_malformed_file_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a cascade").unwrap();

        let state = RunState::new();
        let err = state.load_classifier(file.path()).await.err().unwrap();
        assert!(matches!(
            err,
            WorkerError::Media(MediaError::ClassifierUnpack(_))
        ));
    }

    #[tokio::test]
    async fn test_other_path_conflicts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&cascade_blob()).unwrap();

        let state = RunState::new();
        state.load_classifier(file.path()).await.unwrap();
        let err = state
            .load_classifier(Path::new("cascade/other"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WorkerError::ClassifierConflict { .. }));
    }

    #[test]
    fn test_cancel_token_follows_controller() {
        let state = RunState::new();
        let token = state.cancel_token();
        state.cancellation().cancel();
        assert!(token.is_cancelled());
    }
}
