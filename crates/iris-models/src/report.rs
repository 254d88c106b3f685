//! The assembled report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Metric, ViolationLog, ViolationLogs};

/// Final, immutable report handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    metric_logs: BTreeMap<Metric, ViolationLog>,
    generated_at: DateTime<Utc>,
    source_video_id: String,
}

impl Report {
    /// Build the report from finalized logs, stamped with the current time.
    pub fn assemble(logs: ViolationLogs, source_video_id: impl Into<String>) -> Self {
        Self::assemble_at(logs, source_video_id, Utc::now())
    }

    /// Build the report with an explicit generation time.
    pub fn assemble_at(
        logs: ViolationLogs,
        source_video_id: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            metric_logs: logs.into_inner(),
            generated_at,
            source_video_id: source_video_id.into(),
        }
    }

    pub fn metric_logs(&self) -> &BTreeMap<Metric, ViolationLog> {
        &self.metric_logs
    }

    pub fn log(&self, metric: Metric) -> Option<&ViolationLog> {
        self.metric_logs.get(&metric)
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn source_video_id(&self) -> &str {
        &self.source_video_id
    }

    pub fn total_violations(&self) -> usize {
        self.metric_logs.values().map(ViolationLog::len).sum()
    }
}
