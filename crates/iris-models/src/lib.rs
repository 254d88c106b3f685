//! Shared data models for IRIS photosensitivity reports.
//!
//! This crate provides Serde-serializable types for:
//! - Ordered recording timestamps
//! - Tracked metrics and per-frame metric samples
//! - Violation intervals and their per-metric logs
//! - The assembled report handed to the renderer

pub mod frame;
pub mod metric;
pub mod report;
pub mod timestamp;
pub mod violation;

// Re-export common types
pub use frame::{Resolution, ResolutionError};
pub use metric::{Metric, MetricSample};
pub use report::Report;
pub use timestamp::{Timestamp, TimestampError};
pub use violation::{ViolationInterval, ViolationLog, ViolationLogs};
