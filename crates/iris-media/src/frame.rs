//! Still-frame capture.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use iris_models::{Resolution, Timestamp};

use crate::command::{FfmpegRunner, FrameGrab};
use crate::error::{MediaError, MediaResult};

/// One still-frame request against a source video.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub video_path: PathBuf,
    pub timestamp: Timestamp,
    pub output_dir: PathBuf,
    pub file_name: String,
    pub resolution: Resolution,
}

impl CaptureRequest {
    /// Where the captured frame is written.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

/// Produces a still image from a video at a given timestamp.
#[async_trait]
pub trait FrameCapture: Send + Sync {
    /// Capture one frame, returning the path of the written image.
    ///
    /// The report links whatever path is returned, so it must lie inside
    /// the report directory; [`CaptureRequest::output_path`] is the usual choice.
    async fn capture(&self, request: &CaptureRequest) -> MediaResult<PathBuf>;
}

/// [`FrameCapture`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameCapture {
    runner: FfmpegRunner,
}

impl FfmpegFrameCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill captures that run longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// FFmpeg invocation for a request.
    pub fn grab_for(request: &CaptureRequest) -> FrameGrab {
        FrameGrab::new(&request.video_path, request.timestamp, request.output_path())
            .scaled(request.resolution)
    }
}

#[async_trait]
impl FrameCapture for FfmpegFrameCapture {
    async fn capture(&self, request: &CaptureRequest) -> MediaResult<PathBuf> {
        if !request.video_path.exists() {
            return Err(MediaError::VideoNotFound(request.video_path.clone()));
        }

        let grab = Self::grab_for(request);
        self.runner.run(&grab).await?;

        // seeking past the end exits 0 without writing anything
        let output = grab.output().to_path_buf();
        if !file_exists(&output).await {
            return Err(MediaError::NoFrame(request.timestamp));
        }

        debug!(
            timestamp = %request.timestamp,
            output = %output.display(),
            "Frame captured"
        );
        Ok(output)
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
