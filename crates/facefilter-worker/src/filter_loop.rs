//! The per-frame processing loop.
//!
//! States run `Loading -> Running -> Draining -> Terminated`. Both operating
//! modes share the loop; they differ only in the [`InputSource`] and the
//! [`FrameAction`] handed in. Cancellation is checked once per iteration and
//! never interrupts a read or write in progress.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use facefilter_media::{CancelToken, ChildExit, DetectionStage, FrameReader, ReadOutcome};
use facefilter_models::{Frame, Geometry};
use tracing::{error, info, warn};

use crate::action::FrameAction;
use crate::config::FilterConfig;
use crate::error::WorkerResult;
use crate::input::{ByteStream, InputSource};
use crate::metrics;
use crate::run_state::RunState;
use crate::throughput::ThroughputMonitor;

/// Loop lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Loading,
    Running,
    Draining,
    Terminated,
}

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Cancelled,
}

/// Totals for a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub detections: u64,
    pub elapsed: Duration,
    pub average_fps: f64,
    pub stop: StopReason,
    pub child_exit: Option<ChildExit>,
}

/// Frame loop parameterized by its post-detection action.
pub struct FilterLoop<A> {
    geometry: Geometry,
    cascade_path: PathBuf,
    min_score: f32,
    run_state: Arc<RunState>,
    action: A,
    state: LoopState,
}

impl<A> FilterLoop<A>
where
    A: FrameAction,
{
    pub fn new(
        geometry: Geometry,
        cascade_path: impl Into<PathBuf>,
        min_score: f32,
        run_state: Arc<RunState>,
        action: A,
    ) -> Self {
        Self {
            geometry,
            cascade_path: cascade_path.into(),
            min_score,
            run_state,
            action,
            state: LoopState::Loading,
        }
    }

    pub fn from_config(config: &FilterConfig, run_state: Arc<RunState>, action: A) -> Self {
        Self::new(
            config.geometry,
            config.cascade_path.clone(),
            config.min_score,
            run_state,
            action,
        )
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn into_action(self) -> A {
        self.action
    }

    /// Run until end of stream, cancellation or a fatal error.
    ///
    /// Whatever the outcome, the input stream is closed and any owned
    /// pipeline process is terminated before this returns. Output is
    /// flushed after both, and only when the run ended cleanly.
    pub async fn run(&mut self, input: InputSource) -> WorkerResult<RunSummary> {
        self.state = LoopState::Loading;
        let detector = match self.run_state.load_classifier(&self.cascade_path).await {
            Ok(detector) => detector,
            Err(e) => {
                self.state = LoopState::Terminated;
                return Err(e);
            }
        };
        let stage = DetectionStage::new(detector, self.min_score);
        let cancel = self.run_state.cancel_token();

        info!(mode = self.action.mode(), "Opening {}", input.describe());
        let (stream, guard) = match input.open(&cancel) {
            Ok(opened) => opened.into_parts(),
            Err(e) => {
                self.state = LoopState::Terminated;
                return Err(e.into());
            }
        };
        let mut reader = FrameReader::new(stream, self.geometry);
        info!(
            "Expecting GRAY8 frames of {} ({} bytes)",
            self.geometry,
            self.geometry.frame_len()
        );

        self.state = LoopState::Running;
        let mut throughput = ThroughputMonitor::new();
        let mut detections = 0u64;
        let outcome = self
            .run_frames(&mut reader, &stage, &cancel, &mut throughput, &mut detections)
            .await;

        self.state = LoopState::Draining;
        info!("Shutting down");
        let child_exit = guard.release(reader.into_inner()).await;
        let finished = match outcome {
            Ok(_) => self.action.finish().await,
            Err(_) => Ok(()),
        };
        self.state = LoopState::Terminated;

        let stop = outcome?;
        finished?;

        let report = throughput.report_at(Instant::now());
        info!(
            frames = report.frames,
            detections,
            "Exiting after {} frames ({:.1} FPS)",
            report.frames,
            report.average_fps
        );

        Ok(RunSummary {
            frames: report.frames,
            detections,
            elapsed: report.elapsed,
            average_fps: report.average_fps,
            stop,
            child_exit,
        })
    }

    async fn run_frames(
        &mut self,
        reader: &mut FrameReader<ByteStream>,
        stage: &DetectionStage,
        cancel: &CancelToken,
        throughput: &mut ThroughputMonitor,
        detections_total: &mut u64,
    ) -> WorkerResult<StopReason> {
        let mut frame = Frame::new(self.geometry);

        loop {
            if cancel.is_cancelled() {
                info!("Cancellation requested, stopping main loop");
                return Ok(StopReason::Cancelled);
            }

            match reader.read_frame(&mut frame).await {
                Ok(ReadOutcome::Frame) => {}
                Ok(ReadOutcome::EndOfStream) if cancel.is_cancelled() => {
                    info!("Input stream closed after cancellation");
                    return Ok(StopReason::Cancelled);
                }
                Ok(ReadOutcome::EndOfStream) => {
                    info!(frames = reader.frames_read(), "Input stream ended");
                    return Ok(StopReason::EndOfStream);
                }
                // The pipeline was killed mid-frame on our own request.
                Err(e) if e.is_framing() && cancel.is_cancelled() => {
                    warn!("Discarding partial frame after cancellation: {}", e);
                    return Ok(StopReason::Cancelled);
                }
                Err(e) => {
                    error!(
                        frames = reader.frames_read(),
                        frame_bytes = self.geometry.frame_len(),
                        "Error reading frame: {}",
                        e
                    );
                    return Err(e.into());
                }
            }

            let index = reader.frames_read();
            let started = Instant::now();
            let detections = stage.run(&frame);
            let detect_secs = started.elapsed().as_secs_f64();

            for det in &detections {
                info!(
                    frame = index,
                    row = det.row,
                    col = det.col,
                    scale = det.scale,
                    score = det.score,
                    "Face detected"
                );
            }
            *detections_total += detections.len() as u64;

            if let Err(e) = self.action.apply(&mut frame, &detections).await {
                error!(frame = index, "Error forwarding frame: {}", e);
                return Err(e);
            }

            metrics::record_frame(self.action.mode(), detections.len(), detect_secs);
            if let Some(report) = throughput.record_frame() {
                info!(
                    frames = report.frames,
                    fps = report.average_fps,
                    "Processed frames"
                );
                metrics::set_average_fps(report.average_fps);
            }
        }
    }
}
