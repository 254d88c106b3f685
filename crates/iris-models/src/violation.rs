//! Violation intervals and the per-metric logs that hold them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Metric, Timestamp};

/// A maximal span during which one metric stayed at or above the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationInterval {
    pub metric: Metric,
    pub start: Timestamp,
    pub end: Timestamp,
    /// 1-based ordinal among this metric's intervals.
    pub index: u32,
    /// Sampled frame, relative to the report root. Unset when capture failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
}

impl ViolationInterval {
    /// Length of the interval in milliseconds.
    pub fn duration_millis(&self) -> u64 {
        self.end.as_millis().saturating_sub(self.start.as_millis())
    }

    pub fn has_artifact(&self) -> bool {
        self.artifact_path.is_some()
    }
}

/// Append-only, temporally ordered intervals for one metric.
///
/// Entries are never reordered or removed; the only mutation after
/// insertion is attaching an artifact path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationLog {
    metric: Metric,
    intervals: Vec<ViolationInterval>,
}

impl ViolationLog {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            intervals: Vec::new(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Append a closed interval, assigning the next index.
    pub fn close(&mut self, start: Timestamp, end: Timestamp) -> &ViolationInterval {
        let index = self.intervals.len() as u32 + 1;
        self.intervals.push(ViolationInterval {
            metric: self.metric,
            start,
            end,
            index,
            artifact_path: None,
        });
        &self.intervals[self.intervals.len() - 1]
    }

    /// Record the artifact for the interval with `index`.
    ///
    /// Returns `false` if no such interval exists.
    pub fn attach_artifact(&mut self, index: u32, path: impl Into<String>) -> bool {
        match self.intervals.iter_mut().find(|i| i.index == index) {
            Some(interval) => {
                interval.artifact_path = Some(path.into());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: u32) -> Option<&ViolationInterval> {
        self.intervals.iter().find(|i| i.index == index)
    }

    pub fn intervals(&self) -> &[ViolationInterval] {
        &self.intervals
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViolationInterval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// One [`ViolationLog`] per tracked metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationLogs {
    logs: BTreeMap<Metric, ViolationLog>,
}

impl Default for ViolationLogs {
    fn default() -> Self {
        Self::new()
    }
}

impl ViolationLogs {
    /// Empty logs for every tracked metric.
    pub fn new() -> Self {
        Self {
            logs: Metric::ALL
                .iter()
                .map(|&metric| (metric, ViolationLog::new(metric)))
                .collect(),
        }
    }

    /// Insert or replace the log for its metric.
    pub fn insert(&mut self, log: ViolationLog) {
        self.logs.insert(log.metric(), log);
    }

    pub fn log(&self, metric: Metric) -> Option<&ViolationLog> {
        self.logs.get(&metric)
    }

    pub fn log_mut(&mut self, metric: Metric) -> Option<&mut ViolationLog> {
        self.logs.get_mut(&metric)
    }

    /// Intervals recorded for `metric`; empty if the metric is not tracked.
    pub fn intervals(&self, metric: Metric) -> &[ViolationInterval] {
        self.log(metric).map(ViolationLog::intervals).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Metric, &ViolationLog)> {
        self.logs.iter()
    }

    /// Every interval across all metrics, metric by metric.
    pub fn all_intervals(&self) -> impl Iterator<Item = &ViolationInterval> {
        self.logs.values().flat_map(ViolationLog::iter)
    }

    pub fn total_intervals(&self) -> usize {
        self.logs.values().map(ViolationLog::len).sum()
    }

    pub fn into_inner(self) -> BTreeMap<Metric, ViolationLog> {
        self.logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_assigns_sequential_indices() {
        let mut log = ViolationLog::new(Metric::Luminance);
        log.close(Timestamp::from_secs(1), Timestamp::from_secs(2));
        let second = log.close(Timestamp::from_secs(3), Timestamp::from_secs(4));
        assert_eq!(second.index, 2);
        assert_eq!(second.metric, Metric::Luminance);
        assert!(second.artifact_path.is_none());
    }

    #[test]
    fn test_attach_artifact() {
        let mut log = ViolationLog::new(Metric::Red);
        log.close(Timestamp::from_secs(1), Timestamp::from_secs(2));

        assert!(log.attach_artifact(1, "redFrames/frame_001_at_00-00-01.png"));
        assert!(!log.attach_artifact(7, "missing.png"));
        assert!(log.get(1).unwrap().has_artifact());
    }

    #[test]
    fn test_logs_cover_every_metric() {
        let logs = ViolationLogs::new();
        for metric in Metric::ALL {
            assert!(logs.log(metric).unwrap().is_empty());
        }
        assert_eq!(logs.total_intervals(), 0);
    }

    #[test]
    fn test_logs_serialize_keyed_by_metric() {
        let mut logs = ViolationLogs::new();
        logs.log_mut(Metric::Red)
            .unwrap()
            .close(Timestamp::from_secs(5), Timestamp::from_secs(6));

        let json = serde_json::to_value(&logs).unwrap();
        assert_eq!(json["red"]["intervals"][0]["start"], "00:00:05");
        assert!(json["luminance"]["intervals"].as_array().unwrap().is_empty());
    }
}
