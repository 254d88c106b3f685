//! Tracked photosensitivity metrics and per-frame samples.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// A photosensitivity signal tracked per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Luminance-change magnitude.
    Luminance,
    /// Red-saturation-change magnitude.
    Red,
}

impl Metric {
    /// All tracked metrics, in report order.
    pub const ALL: [Metric; 2] = [Metric::Luminance, Metric::Red];

    /// Stable machine name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Luminance => "luminance",
            Metric::Red => "red",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Luminance => "Luminance",
            Metric::Red => "Red",
        }
    }

    /// Report subdirectory holding this metric's sampled frames.
    pub fn frames_dir(&self) -> &'static str {
        match self {
            Metric::Luminance => "luminanceFrames",
            Metric::Red => "redFrames",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the metrics stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: Timestamp,
    pub values: BTreeMap<Metric, f64>,
}

impl MetricSample {
    /// Create a sample with no metric values.
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Returns the sample with `metric` set to `value`.
    pub fn with_value(mut self, metric: Metric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }

    /// Value recorded for `metric`, if any.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }
}
