//! Report configuration.

use std::fmt;
use std::path::PathBuf;

use iris_models::Resolution;

/// Default violation threshold (inclusive).
pub const DEFAULT_VIOLATION_THRESHOLD: f64 = 3.0;

/// How a metrics-file column is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Header name, matched exactly after trimming.
    Name(String),
    /// Zero-based column position.
    Index(usize),
}

impl ColumnSelector {
    /// Parse a selector: `#N` selects by zero-based index, anything else by name.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix('#').and_then(|n| n.parse().ok()) {
            Some(index) => ColumnSelector::Index(index),
            None => ColumnSelector::Name(raw.to_string()),
        }
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Name(name) => write!(f, "'{}'", name),
            ColumnSelector::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Which columns of the metrics file feed each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub timestamp: ColumnSelector,
    pub luminance: ColumnSelector,
    pub red: ColumnSelector,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            timestamp: ColumnSelector::Name("TimeStamp".to_string()),
            luminance: ColumnSelector::Index(12),
            red: ColumnSelector::Index(13),
        }
    }
}

/// Report configuration.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Output root for the rendered report and sampled frames
    pub report_dir: PathBuf,
    /// Directory holding source videos, one file per video id
    pub video_dir: PathBuf,
    /// Values at or above this are violations
    pub violation_threshold: f64,
    /// Resolution of sampled frames
    pub image_resolution: Resolution,
    /// Maximum frame captures in flight
    pub max_concurrent_captures: usize,
    /// Extra attempts per failed capture (0 = no retry)
    pub capture_retries: u32,
    /// Per-capture timeout
    pub capture_timeout_secs: Option<u64>,
    /// Template file overriding the embedded one
    pub template_path: Option<PathBuf>,
    /// Metrics-file column contract
    pub columns: ColumnMapping,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("./report"),
            video_dir: PathBuf::from("../../tmp/video-tests"),
            violation_threshold: DEFAULT_VIOLATION_THRESHOLD,
            image_resolution: Resolution::default(),
            max_concurrent_captures: 4,
            capture_retries: 0,
            capture_timeout_secs: None,
            template_path: None,
            columns: ColumnMapping::default(),
        }
    }
}

impl ReportConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            report_dir: std::env::var("IRIS_REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_dir),
            video_dir: std::env::var("IRIS_VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.video_dir),
            violation_threshold: std::env::var("IRIS_VIOLATION_THRESHOLD")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|t| t.is_finite())
                .unwrap_or(defaults.violation_threshold),
            image_resolution: std::env::var("IRIS_IMAGE_RESOLUTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.image_resolution),
            max_concurrent_captures: std::env::var("IRIS_MAX_CONCURRENT_CAPTURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.max_concurrent_captures),
            capture_retries: std::env::var("IRIS_CAPTURE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.capture_retries),
            capture_timeout_secs: std::env::var("IRIS_CAPTURE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
            template_path: std::env::var("IRIS_TEMPLATE_PATH").ok().map(PathBuf::from),
            columns: ColumnMapping {
                timestamp: env_column("IRIS_TIMESTAMP_COLUMN", defaults.columns.timestamp),
                luminance: env_column("IRIS_LUMINANCE_COLUMN", defaults.columns.luminance),
                red: env_column("IRIS_RED_COLUMN", defaults.columns.red),
            },
        }
    }

    /// Path of the source video for `video_id`.
    pub fn video_path(&self, video_id: &str) -> PathBuf {
        self.video_dir.join(video_id)
    }
}

fn env_column(var: &str, default: ColumnSelector) -> ColumnSelector {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(|s| ColumnSelector::parse(&s))
        .unwrap_or(default)
}
