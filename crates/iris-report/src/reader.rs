//! Metrics-file reader.
//!
//! Reads a CSV file with a header row and yields one [`MetricSample`] per
//! data row. Columns are located through a [`ColumnMapping`] resolved once
//! against the header, so every row is read with the same positions.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{StringRecord, StringRecordsIntoIter, Trim};

use iris_models::{Metric, MetricSample, Timestamp};

use crate::config::{ColumnMapping, ColumnSelector};
use crate::error::{ReaderError, ReportError, ReportResult};

#[derive(Debug, Clone, Copy)]
struct ResolvedColumns {
    timestamp: usize,
    luminance: usize,
    red: usize,
}

/// Streaming reader over a metrics file.
pub struct MetricsReader<R: Read> {
    records: StringRecordsIntoIter<R>,
    columns: ResolvedColumns,
}

impl MetricsReader<File> {
    /// Open a metrics file on disk.
    pub fn open(path: impl AsRef<Path>, mapping: &ColumnMapping) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, mapping)
    }
}

impl<R: Read> MetricsReader<R> {
    /// Wrap any CSV source. Reads the header immediately.
    pub fn from_reader(source: R, mapping: &ColumnMapping) -> Result<Self, ReaderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let columns = ResolvedColumns {
            timestamp: resolve(&headers, "timestamp", &mapping.timestamp)?,
            luminance: resolve(&headers, "luminance", &mapping.luminance)?,
            red: resolve(&headers, "red", &mapping.red)?,
        };

        Ok(Self {
            records: reader.into_records(),
            columns,
        })
    }

    fn parse_record(&self, record: &StringRecord) -> Result<MetricSample, ReaderError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_ts = cell(record, self.columns.timestamp, line, "timestamp")?;
        let timestamp = Timestamp::parse(raw_ts)
            .map_err(|source| ReaderError::InvalidTimestamp { line, source })?;

        let luminance = metric_value(record, self.columns.luminance, line, Metric::Luminance)?;
        let red = metric_value(record, self.columns.red, line, Metric::Red)?;

        Ok(MetricSample::new(timestamp)
            .with_value(Metric::Luminance, luminance)
            .with_value(Metric::Red, red))
    }
}

impl<R: Read> Iterator for MetricsReader<R> {
    type Item = Result<MetricSample, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(self.parse_record(&record))
    }
}

fn resolve(
    headers: &StringRecord,
    field: &'static str,
    selector: &ColumnSelector,
) -> Result<usize, ReaderError> {
    let found = match selector {
        ColumnSelector::Name(name) => headers.iter().position(|h| h == name.as_str()),
        ColumnSelector::Index(index) => (*index < headers.len()).then_some(*index),
    };
    found.ok_or_else(|| ReaderError::MissingColumn {
        field,
        selector: selector.clone(),
    })
}

fn cell<'r>(
    record: &'r StringRecord,
    index: usize,
    line: u64,
    field: &str,
) -> Result<&'r str, ReaderError> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ReaderError::malformed_row(line, format!("missing {} value", field))),
    }
}

fn metric_value(
    record: &StringRecord,
    index: usize,
    line: u64,
    metric: Metric,
) -> Result<f64, ReaderError> {
    let raw = cell(record, index, line, metric.as_str())?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ReaderError::malformed_row(line, format!("{} value '{}' is not a number", metric, raw))
        })
}

/// Source video id for a metrics file: the name of its containing directory.
///
/// `/data/flash-test.mp4/metrics.csv` belongs to `flash-test.mp4`.
pub fn source_video_id(metrics_path: impl AsRef<Path>) -> ReportResult<String> {
    let metrics_path = metrics_path.as_ref();
    metrics_path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ReportError::input(format!(
                "cannot derive a video id from {}: the metrics file must sit in a directory named after the video",
                metrics_path.display()
            ))
        })
}
