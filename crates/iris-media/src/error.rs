//! Frame capture errors.

use std::path::PathBuf;

use iris_models::Timestamp;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg binary not found in PATH")]
    FfmpegNotFound,

    #[error("source video not found: {0}")]
    VideoNotFound(PathBuf),

    /// FFmpeg ran and exited unsuccessfully. `exit_code` is `None` when the
    /// process was killed by a signal.
    #[error("ffmpeg exited with code {exit_code:?}: {stderr}")]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// FFmpeg succeeded but wrote nothing, typically a seek past the end.
    #[error("no frame available at {0}")]
    NoFrame(Timestamp),

    #[error("frame capture timed out after {0}s")]
    Timeout(u64),

    /// A capture reported a frame outside the report directory.
    #[error("frame written outside the report directory: {}", .0.display())]
    OutsideOutput(PathBuf),

    #[error("capture slots closed")]
    SlotsClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
