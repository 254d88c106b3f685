//! Photosensitivity violation reports.
//!
//! This crate provides:
//! - Metrics-file reading with an explicit column contract
//! - Per-metric violation interval detection
//! - Concurrent frame sampling for every detected interval
//! - Report assembly, rendering and output

pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod reader;
pub mod render;
pub mod retry;
pub mod sampler;

pub use config::{ColumnMapping, ColumnSelector, ReportConfig};
pub use detector::{detect_violations, DetectorState, IntervalDetector, MetricDetector, PartialDetection};
pub use error::{ReaderError, ReportError, ReportResult};
pub use logging::{RunLogger, DEFAULT_LOG_FILTER};
pub use pipeline::{ReportOutput, ReportPipeline};
pub use reader::{source_video_id, MetricsReader};
pub use render::{ReportRenderer, TemplateRenderer};
pub use sampler::{FrameSampler, SamplingSummary};
