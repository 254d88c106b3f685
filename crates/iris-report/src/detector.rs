//! Violation interval detection.
//!
//! Each tracked metric runs its own two-state machine over the sample
//! stream:
//!
//! ```text
//!            value >= threshold
//!   Idle  ──────────────────────▶  Active { start }
//!    ▲                                   │
//!    └───────────────────────────────────┘
//!      value < threshold: close [start, now]
//! ```
//!
//! Transitions only happen on a threshold crossing, so repeated readings
//! on either side are no-ops. When the stream ends, any interval still
//! open is closed at the last observed timestamp.

use iris_models::{Metric, MetricSample, Timestamp, ViolationInterval, ViolationLog, ViolationLogs};

/// Per-metric detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    #[default]
    Idle,
    /// Inside a violation that began at `start`.
    Active { start: Timestamp },
}

impl DetectorState {
    pub fn is_active(&self) -> bool {
        matches!(self, DetectorState::Active { .. })
    }

    /// Start of the open interval, if any.
    pub fn pending_start(&self) -> Option<Timestamp> {
        match self {
            DetectorState::Active { start } => Some(*start),
            DetectorState::Idle => None,
        }
    }
}

/// Single-metric state machine owning that metric's log.
#[derive(Debug, Clone)]
pub struct MetricDetector {
    threshold: f64,
    state: DetectorState,
    log: ViolationLog,
}

impl MetricDetector {
    pub fn new(metric: Metric, threshold: f64) -> Self {
        Self {
            threshold,
            state: DetectorState::Idle,
            log: ViolationLog::new(metric),
        }
    }

    pub fn metric(&self) -> Metric {
        self.log.metric()
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn log(&self) -> &ViolationLog {
        &self.log
    }

    /// Feed one reading. Returns the interval closed by this reading, if any.
    pub fn observe(&mut self, timestamp: Timestamp, value: f64) -> Option<&ViolationInterval> {
        let violating = value >= self.threshold;
        match (self.state, violating) {
            (DetectorState::Idle, true) => {
                self.state = DetectorState::Active { start: timestamp };
                None
            }
            (DetectorState::Active { start }, false) => {
                self.state = DetectorState::Idle;
                Some(self.log.close(start, timestamp))
            }
            _ => None,
        }
    }

    /// Close an open interval at `last_seen`. Returns the closed interval, if any.
    pub fn flush(&mut self, last_seen: Timestamp) -> Option<&ViolationInterval> {
        match std::mem::take(&mut self.state) {
            DetectorState::Active { start } => Some(self.log.close(start, last_seen)),
            DetectorState::Idle => None,
        }
    }

    pub fn into_log(self) -> ViolationLog {
        self.log
    }
}

/// Independent detectors for every tracked metric.
#[derive(Debug, Clone)]
pub struct IntervalDetector {
    detectors: Vec<MetricDetector>,
    last_timestamp: Option<Timestamp>,
}

impl IntervalDetector {
    /// Detector for all tracked metrics with the given inclusive threshold.
    pub fn new(threshold: f64) -> Self {
        Self::for_metrics(&Metric::ALL, threshold)
    }

    pub fn for_metrics(metrics: &[Metric], threshold: f64) -> Self {
        Self {
            detectors: metrics
                .iter()
                .map(|&metric| MetricDetector::new(metric, threshold))
                .collect(),
            last_timestamp: None,
        }
    }

    /// Feed one sample to every metric detector.
    ///
    /// Metrics absent from the sample keep their state.
    pub fn observe(&mut self, sample: &MetricSample) {
        for detector in &mut self.detectors {
            if let Some(value) = sample.value(detector.metric()) {
                if let Some(interval) = detector.observe(sample.timestamp, value) {
                    tracing::debug!(
                        metric = %interval.metric,
                        index = interval.index,
                        start = %interval.start,
                        end = %interval.end,
                        "Violation closed"
                    );
                }
            }
        }
        self.last_timestamp = Some(sample.timestamp);
    }

    pub fn state(&self, metric: Metric) -> Option<DetectorState> {
        self.detectors
            .iter()
            .find(|d| d.metric() == metric)
            .map(MetricDetector::state)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    /// End of stream: flush open intervals and hand over the logs.
    pub fn finish(mut self) -> ViolationLogs {
        if let Some(last) = self.last_timestamp {
            for detector in &mut self.detectors {
                if let Some(interval) = detector.flush(last) {
                    tracing::debug!(
                        metric = %interval.metric,
                        index = interval.index,
                        start = %interval.start,
                        end = %interval.end,
                        "Violation flushed at end of stream"
                    );
                }
            }
        }

        let mut logs = ViolationLogs::new();
        for detector in self.detectors {
            logs.insert(detector.into_log());
        }
        logs
    }
}

/// Detection cut short by a stream error.
///
/// `logs` holds everything detected up to the last good sample, with open
/// intervals already flushed.
#[derive(Debug)]
pub struct PartialDetection<E> {
    pub logs: ViolationLogs,
    pub error: E,
}

/// Run detection over a fallible sample stream.
pub fn detect_violations<I, E>(samples: I, threshold: f64) -> Result<ViolationLogs, PartialDetection<E>>
where
    I: IntoIterator<Item = Result<MetricSample, E>>,
{
    let mut detector = IntervalDetector::new(threshold);

    for sample in samples {
        match sample {
            Ok(sample) => detector.observe(&sample),
            Err(error) => {
                return Err(PartialDetection {
                    logs: detector.finish(),
                    error,
                })
            }
        }
    }

    Ok(detector.finish())
}
