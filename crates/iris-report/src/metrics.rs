//! Run metrics.
//!
//! Counters go through the `metrics` facade; with no recorder installed
//! they are no-ops.

use metrics::counter;

use iris_models::Metric;

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_CAPTURED_TOTAL: &str = "iris_frames_captured_total";
    pub const FRAMES_FAILED_TOTAL: &str = "iris_frames_failed_total";
    pub const VIOLATIONS_DETECTED_TOTAL: &str = "iris_violations_detected_total";
}

/// Record a successfully sampled frame.
pub fn record_frame_captured(metric: Metric) {
    let labels = [("metric", metric.as_str().to_string())];
    counter!(names::FRAMES_CAPTURED_TOTAL, &labels).increment(1);
}

/// Record a frame that could not be sampled.
pub fn record_frame_failed(metric: Metric) {
    let labels = [("metric", metric.as_str().to_string())];
    counter!(names::FRAMES_FAILED_TOTAL, &labels).increment(1);
}

/// Record detected violations for a metric.
pub fn record_violations(metric: Metric, count: usize) {
    let labels = [("metric", metric.as_str().to_string())];
    counter!(names::VIOLATIONS_DETECTED_TOTAL, &labels).increment(count as u64);
}
