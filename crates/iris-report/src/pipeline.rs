//! End-to-end report run.
//!
//! detect → clean output → sample frames (join) → assemble → render → write.
//! Detection results are logged before anything touches the output
//! directory, so they survive output failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use iris_media::{DirectoryCleaner, FfmpegFrameCapture, FrameCapture, OutputCleaner};
use iris_models::{Report, ViolationLogs};

use crate::config::ReportConfig;
use crate::detector::detect_violations;
use crate::error::{ReportError, ReportResult};
use crate::logging::RunLogger;
use crate::metrics::record_violations;
use crate::reader::{source_video_id, MetricsReader};
use crate::render::{ReportRenderer, TemplateRenderer, REPORT_TEMPLATE};
use crate::sampler::{FrameSampler, SamplingSummary};

/// Rendered report file name at the report root.
pub const REPORT_FILE: &str = "index.html";
/// Machine-readable violations file at the report root.
pub const VIOLATIONS_FILE: &str = "violations.json";

/// Result of a successful run.
#[derive(Debug)]
pub struct ReportOutput {
    pub report: Report,
    pub sampling: SamplingSummary,
    pub report_path: PathBuf,
    pub violations_path: PathBuf,
}

/// Wires the reader, detector, sampler and renderer together.
pub struct ReportPipeline {
    config: ReportConfig,
    capture: Arc<dyn FrameCapture>,
    renderer: Arc<dyn ReportRenderer>,
    cleaner: Arc<dyn OutputCleaner>,
}

impl ReportPipeline {
    pub fn new(
        config: ReportConfig,
        capture: Arc<dyn FrameCapture>,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self {
            config,
            capture,
            renderer,
            cleaner: Arc::new(DirectoryCleaner),
        }
    }

    /// Replace how stale output is removed before sampling.
    pub fn with_cleaner(mut self, cleaner: Arc<dyn OutputCleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Pipeline using FFmpeg captures and the configured template.
    ///
    /// A template file is only read when the report is rendered.
    pub fn from_config(config: ReportConfig) -> ReportResult<Self> {
        let capture = match config.capture_timeout_secs {
            Some(secs) => FfmpegFrameCapture::new().with_timeout(secs),
            None => FfmpegFrameCapture::new(),
        };
        let renderer = match &config.template_path {
            Some(path) => TemplateRenderer::from_file(path)?,
            None => TemplateRenderer::new()?,
        };
        Ok(Self::new(config, Arc::new(capture), Arc::new(renderer)))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Produce the report for one metrics file.
    pub async fn run(&self, metrics_path: impl AsRef<Path>) -> ReportResult<ReportOutput> {
        let metrics_path = metrics_path.as_ref();
        let video_id = source_video_id(metrics_path)?;
        let logger = RunLogger::new(&video_id, "detect");

        let logs = self.detect(metrics_path, &logger)?;

        let sample_logger = logger.phase("sample");
        self.clean_output(&sample_logger).await;

        let sampler = FrameSampler::from_config(
            &self.config,
            self.capture.clone(),
            self.config.video_path(&video_id),
        );
        sampler
            .prepare_directories()
            .await
            .map_err(|e| ReportError::output(&self.config.report_dir, e))?;
        let (logs, sampling) = sampler.sample_all(logs, &sample_logger).await;

        let report = Report::assemble(logs, video_id);
        let (report_path, violations_path) = self.write(&report, &logger.phase("render")).await?;

        Ok(ReportOutput {
            report,
            sampling,
            report_path,
            violations_path,
        })
    }

    /// Read the metrics file and detect violations.
    ///
    /// A stream failure still logs what was detected before it.
    pub fn detect(&self, metrics_path: &Path, logger: &RunLogger) -> ReportResult<ViolationLogs> {
        let _span = logger.create_span().entered();
        logger.log_start(&format!("reading {}", metrics_path.display()));

        let reader = MetricsReader::open(metrics_path, &self.config.columns)?;

        match detect_violations(reader, self.config.violation_threshold) {
            Ok(logs) => {
                for (metric, log) in logs.iter() {
                    record_violations(*metric, log.len());
                }
                logger.log_violations(&logs);
                logger.log_completion(&format!("{} violations", logs.total_intervals()));
                Ok(logs)
            }
            Err(partial) => {
                logger.log_violations(&partial.logs);
                logger.log_error(&format!(
                    "metrics stream aborted after {} violations: {}",
                    partial.logs.total_intervals(),
                    partial.error
                ));
                Err(partial.error.into())
            }
        }
    }

    /// Remove stale output. Failure only warns.
    async fn clean_output(&self, logger: &RunLogger) {
        if let Err(e) = self.cleaner.clean(&self.config.report_dir).await {
            logger.log_warning(&format!(
                "couldn't clean directory {}: {}",
                self.config.report_dir.display(),
                e
            ));
        }
    }

    /// Render and write the report files.
    async fn write(&self, report: &Report, logger: &RunLogger) -> ReportResult<(PathBuf, PathBuf)> {
        let html = self.renderer.render(REPORT_TEMPLATE, report)?;
        let json = serde_json::to_string_pretty(report)?;

        let report_path = self.config.report_dir.join(REPORT_FILE);
        tokio::fs::write(&report_path, html)
            .await
            .map_err(|e| ReportError::output(&report_path, e))?;

        let violations_path = self.config.report_dir.join(VIOLATIONS_FILE);
        tokio::fs::write(&violations_path, json)
            .await
            .map_err(|e| ReportError::output(&violations_path, e))?;

        logger.log_completion(&format!("report written to {}", report_path.display()));
        Ok((report_path, violations_path))
    }
}
