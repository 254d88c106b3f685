//! FFmpeg invocation for single-frame grabs.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use iris_models::{Resolution, Timestamp};

use crate::error::{MediaError, MediaResult};

/// One `ffmpeg` call that decodes a single frame at `at` and writes it as an image.
#[derive(Debug, Clone)]
pub struct FrameGrab {
    video: PathBuf,
    at: Timestamp,
    output: PathBuf,
    scale: Option<Resolution>,
}

impl FrameGrab {
    pub fn new(video: impl AsRef<Path>, at: Timestamp, output: impl AsRef<Path>) -> Self {
        Self {
            video: video.as_ref().to_path_buf(),
            at,
            output: output.as_ref().to_path_buf(),
            scale: None,
        }
    }

    /// Resize the grabbed frame.
    pub fn scaled(mut self, resolution: Resolution) -> Self {
        self.scale = Some(resolution);
        self
    }

    pub fn at(&self) -> Timestamp {
        self.at
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Arguments passed to `ffmpeg`.
    ///
    /// `-ss` goes before `-i` so FFmpeg seeks on the input instead of
    /// decoding every frame up to the timestamp.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            self.at.to_seek_arg(),
            "-i".to_string(),
            self.video.to_string_lossy().into_owned(),
            "-frames:v".to_string(),
            "1".to_string(),
        ];
        if let Some(resolution) = self.scale {
            args.push("-vf".to_string());
            args.push(resolution.scale_filter());
        }
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Spawns `ffmpeg` and waits for it, optionally with a deadline.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the process if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub async fn run(&self, grab: &FrameGrab) -> MediaResult<()> {
        let program = locate_ffmpeg()?;
        let args = grab.args();
        debug!(at = %grab.at(), "ffmpeg {}", args.join(" "));

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let waiting = child.wait_with_output();
        let output = match self.timeout_secs {
            None => waiting.await?,
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), waiting).await {
                Ok(result) => result?,
                Err(_) => {
                    // the elapsed future owned the child; kill_on_drop reaps it
                    warn!(at = %grab.at(), "ffmpeg still running after {}s, killed", secs);
                    return Err(MediaError::Timeout(secs));
                }
            },
        };

        if output.status.success() {
            return Ok(());
        }
        Err(MediaError::ProcessFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Path of the `ffmpeg` binary on `PATH`.
pub fn locate_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
