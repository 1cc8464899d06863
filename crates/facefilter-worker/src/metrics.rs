//! Prometheus metrics for the filter loop.
//!
//! Without [`init_metrics`] the recording helpers are no-ops.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_TOTAL: &str = "facefilter_frames_total";
    pub const DETECTIONS_TOTAL: &str = "facefilter_detections_total";
    pub const AVERAGE_FPS: &str = "facefilter_average_fps";
    pub const DETECT_DURATION_SECONDS: &str = "facefilter_detect_duration_seconds";
}

/// Serve a Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::metrics_failed(e.to_string()))
}

/// Record one processed frame.
pub fn record_frame(mode: &'static str, detections: usize, detect_secs: f64) {
    let labels = [("mode", mode)];
    counter!(names::FRAMES_TOTAL, &labels).increment(1);
    counter!(names::DETECTIONS_TOTAL, &labels).increment(detections as u64);
    histogram!(names::DETECT_DURATION_SECONDS, &labels).record(detect_secs);
}

/// Update the running average throughput.
pub fn set_average_fps(fps: f64) {
    gauge!(names::AVERAGE_FPS).set(fps);
}
