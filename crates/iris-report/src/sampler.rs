//! Frame sampling for detected violations.
//!
//! Every interval gets one still frame captured at its start. Captures are
//! issued together, throttled by a semaphore, and all of them are awaited
//! before any artifact path is attached to the logs. A failed capture
//! leaves its interval without an artifact; it never affects the others.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use iris_media::{ensure_directory, CaptureRequest, FrameCapture, MediaError, MediaResult};
use iris_models::frame::FRAME_EXTENSION;
use iris_models::{Metric, Resolution, ViolationInterval, ViolationLogs};

use crate::config::ReportConfig;
use crate::logging::RunLogger;
use crate::metrics::{record_frame_captured, record_frame_failed};
use crate::retry::{with_backoff, CapturePolicy};

/// File name for an interval's frame, unique within its metric directory.
pub fn frame_file_name(interval: &ViolationInterval) -> String {
    format!(
        "frame_{:03}_at_{}.{}",
        interval.index,
        interval.start.to_filename_safe(),
        FRAME_EXTENSION
    )
}

/// A captured frame's path relative to the report root, `/`-separated as
/// the report references it. `None` if `frame` is outside `report_dir`.
pub fn artifact_path(report_dir: &Path, frame: &Path) -> Option<String> {
    let relative = frame.strip_prefix(report_dir).ok()?;
    let parts = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Outcome counts for one sampling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingSummary {
    pub requested: usize,
    pub captured: usize,
    pub failed: usize,
}

impl SamplingSummary {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Captures one frame per violation interval.
pub struct FrameSampler {
    capture: Arc<dyn FrameCapture>,
    report_dir: PathBuf,
    video_path: PathBuf,
    resolution: Resolution,
    limiter: Arc<Semaphore>,
    policy: CapturePolicy,
}

impl FrameSampler {
    pub fn new(
        capture: Arc<dyn FrameCapture>,
        report_dir: impl AsRef<Path>,
        video_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            capture,
            report_dir: report_dir.as_ref().to_path_buf(),
            video_path: video_path.as_ref().to_path_buf(),
            resolution: Resolution::default(),
            limiter: Arc::new(Semaphore::new(4)),
            policy: CapturePolicy::default(),
        }
    }

    /// Sampler configured from report settings.
    pub fn from_config(
        config: &ReportConfig,
        capture: Arc<dyn FrameCapture>,
        video_path: impl AsRef<Path>,
    ) -> Self {
        Self::new(capture, &config.report_dir, video_path)
            .with_resolution(config.image_resolution)
            .with_max_concurrent(config.max_concurrent_captures)
            .with_retries(config.capture_retries)
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Limit captures in flight (minimum 1).
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// Retry each transient capture failure up to `retries` more times.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.policy.retries = retries;
        self
    }

    pub fn with_policy(mut self, policy: CapturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Directory receiving `metric`'s frames.
    pub fn metric_dir(&self, metric: Metric) -> PathBuf {
        self.report_dir.join(metric.frames_dir())
    }

    /// Create the per-metric frame directories.
    pub async fn prepare_directories(&self) -> MediaResult<()> {
        for metric in Metric::ALL {
            ensure_directory(self.metric_dir(metric)).await?;
        }
        Ok(())
    }

    /// Capture request for an interval.
    pub fn request_for(&self, interval: &ViolationInterval) -> CaptureRequest {
        CaptureRequest {
            video_path: self.video_path.clone(),
            timestamp: interval.start,
            output_dir: self.metric_dir(interval.metric),
            file_name: frame_file_name(interval),
            resolution: self.resolution,
        }
    }

    /// Sample every interval and attach artifact paths for the ones that succeeded.
    ///
    /// Returns only after every capture has resolved.
    pub async fn sample_all(
        &self,
        mut logs: ViolationLogs,
        logger: &RunLogger,
    ) -> (ViolationLogs, SamplingSummary) {
        let jobs: Vec<_> = logs
            .all_intervals()
            .map(|interval| (interval.metric, interval.index, self.request_for(interval)))
            .collect();

        let mut summary = SamplingSummary {
            requested: jobs.len(),
            ..Default::default()
        };
        if jobs.is_empty() {
            return (logs, summary);
        }

        logger.log_start(&format!("capturing {} frames", jobs.len()));

        let captures = jobs.into_iter().map(|(metric, index, request)| async move {
            let outcome = self.capture_one(&request).await.and_then(|frame| {
                artifact_path(&self.report_dir, &frame).ok_or(MediaError::OutsideOutput(frame))
            });
            (metric, index, request, outcome)
        });
        let outcomes = join_all(captures).await;

        for (metric, index, request, outcome) in outcomes {
            match outcome {
                Ok(artifact) => {
                    let attached = logs
                        .log_mut(metric)
                        .map(|log| log.attach_artifact(index, artifact))
                        .unwrap_or(false);
                    if attached {
                        summary.captured += 1;
                        record_frame_captured(metric);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    record_frame_failed(metric);
                    logger.log_warning(&format!(
                        "{} violation #{} at {}: frame capture failed: {}",
                        metric.label(),
                        index,
                        request.timestamp,
                        e
                    ));
                }
            }
        }

        logger.log_completion(&format!(
            "{}/{} frames captured, {} failed",
            summary.captured, summary.requested, summary.failed
        ));
        (logs, summary)
    }

    async fn capture_one(&self, request: &CaptureRequest) -> MediaResult<PathBuf> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| MediaError::SlotsClosed)?;

        with_backoff(&self.policy, &request.file_name, || self.capture.capture(request)).await
    }
}
