//! Post-detection actions, one per operating mode.

use async_trait::async_trait;
use facefilter_media::{annotate, FrameWriter};
use facefilter_models::{DetectionSet, Frame};
use tokio::io::AsyncWrite;

use crate::error::WorkerResult;

/// What happens to a frame after its detections were logged.
#[async_trait]
pub trait FrameAction: Send {
    /// Short label used in logs and metrics.
    fn mode(&self) -> &'static str;

    /// Handle one frame. `frame` may be mutated in place.
    async fn apply(&mut self, frame: &mut Frame, detections: &DetectionSet) -> WorkerResult<()>;

    /// Flush anything still buffered. Called once while draining.
    async fn finish(&mut self) -> WorkerResult<()> {
        Ok(())
    }
}

/// Spawn-and-observe mode: the frame is dropped after logging.
#[derive(Debug, Default)]
pub struct ObserveAction;

#[async_trait]
impl FrameAction for ObserveAction {
    fn mode(&self) -> &'static str {
        "spawn"
    }

    async fn apply(&mut self, _frame: &mut Frame, _detections: &DetectionSet) -> WorkerResult<()> {
        Ok(())
    }
}

/// Inline-filter mode: outline detections and forward every frame.
pub struct ForwardAction<W> {
    writer: FrameWriter<W>,
}

impl<W> ForwardAction<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(output: W) -> Self {
        Self {
            writer: FrameWriter::new(output),
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.writer.frames_written()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> FrameAction for ForwardAction<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn mode(&self) -> &'static str {
        "filter"
    }

    async fn apply(&mut self, frame: &mut Frame, detections: &DetectionSet) -> WorkerResult<()> {
        annotate(frame, detections);
        self.writer.write_frame(frame).await?;
        Ok(())
    }

    async fn finish(&mut self) -> WorkerResult<()> {
        self.writer.flush().await?;
        Ok(())
    }
}
