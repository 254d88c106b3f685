//! Report error types.

use std::path::PathBuf;

use thiserror::Error;

use iris_models::TimestampError;

use crate::config::ColumnSelector;

pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised while reading the metrics file.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Cannot open metrics file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Metrics file has no {field} column matching {selector}")]
    MissingColumn {
        field: &'static str,
        selector: ColumnSelector,
    },

    #[error("Malformed row at line {line}: {message}")]
    MalformedRow { line: u64, message: String },

    #[error("Invalid timestamp at line {line}: {source}")]
    InvalidTimestamp {
        line: u64,
        #[source]
        source: TimestampError,
    },
}

impl ReaderError {
    pub fn malformed_row(line: u64, message: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            message: message.into(),
        }
    }
}

/// Errors that terminate a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Metrics stream failed: {0}")]
    Reader(#[from] ReaderError),

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("Cannot write {path}: {message}")]
    Output { path: PathBuf, message: String },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn output(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Output {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Check if the error happened before any detection work.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ReportError::Input(_) | ReportError::Reader(_))
    }

    /// Check if the error happened while producing report output.
    pub fn is_output_error(&self) -> bool {
        matches!(
            self,
            ReportError::Render(_) | ReportError::Output { .. } | ReportError::Json(_)
        )
    }
}
