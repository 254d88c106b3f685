//! Structured run logging.
//!
//! Every event for a report run carries the source video id and the
//! current phase, so interleaved output from concurrent captures can be
//! attributed.

use tracing::{error, info, warn, Span};

use iris_models::ViolationLogs;

/// Filter directives used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "iris_report=info,iris_media=info,iris_models=info";

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    video_id: String,
    phase: String,
}

impl RunLogger {
    /// Create a logger for a video and phase (e.g. "detect", "sample", "render").
    pub fn new(video_id: &str, phase: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            phase: phase.to_string(),
        }
    }

    /// Same video, different phase.
    pub fn phase(&self, phase: &str) -> Self {
        Self::new(&self.video_id, phase)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            phase = %self.phase,
            "Phase started: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            phase = %self.phase,
            "{}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            phase = %self.phase,
            "{}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            phase = %self.phase,
            "Phase completed: {}", message
        );
    }

    /// Log every detected interval so results stay visible even if output fails.
    pub fn log_violations(&self, logs: &ViolationLogs) {
        for (metric, log) in logs.iter() {
            info!(
                video_id = %self.video_id,
                phase = %self.phase,
                metric = %metric,
                count = log.len(),
                "{} violations: {}", metric.label(), log.len()
            );
            for interval in log.iter() {
                info!(
                    video_id = %self.video_id,
                    metric = %metric,
                    index = interval.index,
                    start = %interval.start,
                    end = %interval.end,
                    "{} violation #{}: {} - {}",
                    metric.label(),
                    interval.index,
                    interval.start,
                    interval.end
                );
            }
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn phase_name(&self) -> &str {
        &self.phase
    }

    /// Create a tracing span for this run phase.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "report",
            video_id = %self.video_id,
            phase = %self.phase
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_phases() {
        let logger = RunLogger::new("clip.mp4", "detect");
        let sampling = logger.phase("sample");

        assert_eq!(logger.phase_name(), "detect");
        assert_eq!(sampling.video_id(), "clip.mp4");
        assert_eq!(sampling.phase_name(), "sample");
    }

    #[test]
    fn test_default_filter_covers_every_crate() {
        let filter = tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        let rendered = filter.to_string();
        for krate in ["iris_report", "iris_media", "iris_models"] {
            assert!(rendered.contains(&format!("{}=info", krate)), "{} missing", krate);
        }
    }
}
