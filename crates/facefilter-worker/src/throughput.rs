//! Frame throughput accounting.

use std::time::{Duration, Instant};

/// Frames between two throughput reports.
pub const REPORT_EVERY: u64 = 60;

/// One periodic throughput report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputReport {
    /// Frames processed since the loop started.
    pub frames: u64,
    /// Time since the loop started.
    pub elapsed: Duration,
    /// `frames / elapsed` over the whole run, not an instantaneous rate.
    pub average_fps: f64,
}

/// Counts frames and emits a report every [`REPORT_EVERY`] frames.
#[derive(Debug, Clone)]
pub struct ThroughputMonitor {
    frames: u64,
    started: Instant,
}

impl Default for ThroughputMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ThroughputMonitor {
    /// Start the clock now.
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started: Instant) -> Self {
        Self { frames: 0, started }
    }

    /// Count one frame; returns a report on every 60th.
    pub fn record_frame(&mut self) -> Option<ThroughputReport> {
        self.record_frame_at(Instant::now())
    }

    pub fn record_frame_at(&mut self, now: Instant) -> Option<ThroughputReport> {
        self.frames += 1;
        if self.frames % REPORT_EVERY == 0 {
            Some(self.report_at(now))
        } else {
            None
        }
    }

    /// Cumulative report as of `now`.
    pub fn report_at(&self, now: Instant) -> ThroughputReport {
        let elapsed = now.saturating_duration_since(self.started);
        ThroughputReport {
            frames: self.frames,
            elapsed,
            average_fps: average_fps(self.frames, elapsed),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn average_fps(frames: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        frames as f64 / secs
    } else {
        0.0
    }
}
