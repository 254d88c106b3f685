//! Backoff for frame captures.
//!
//! A capture that fails for a transient reason (a killed or crashed FFmpeg
//! process) may be tried again. Missing videos and seeks past the end are
//! never retried.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use iris_media::MediaError;

/// How many times, and how patiently, a failed capture is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturePolicy {
    /// Extra attempts after the first one. 0 disables retrying.
    pub retries: u32,
    /// Wait before the first retry; doubled for each one after it.
    pub initial_backoff: Duration,
    /// Upper bound on any single wait.
    pub max_backoff: Duration,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl CapturePolicy {
    /// Policy allowing `retries` extra attempts with default backoff.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Default::default()
        }
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Wait before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Whether a capture error is worth another attempt.
pub fn is_transient(error: &MediaError) -> bool {
    matches!(
        error,
        MediaError::ProcessFailed { .. } | MediaError::Timeout(_) | MediaError::Io(_)
    )
}

/// Run `attempt` until it succeeds, fails permanently, or `policy` runs out.
///
/// The last error is returned unchanged.
pub async fn with_backoff<F, Fut, T>(
    policy: &CapturePolicy,
    label: &str,
    mut attempt: F,
) -> Result<T, MediaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MediaError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retry >= policy.retries || !is_transient(&err) {
            return Err(err);
        }
        retry += 1;
        let wait = policy.backoff(retry);
        debug!(%label, retry, ?wait, error = %err, "Retrying frame capture");
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn crashed() -> MediaError {
        MediaError::ProcessFailed {
            exit_code: Some(1),
            stderr: "decoder crashed".to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = CapturePolicy::default().initial_backoff(Duration::from_millis(100));

        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(30), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let mut calls = 0;
        let result: Result<(), _> = with_backoff(&CapturePolicy::default(), "frame", || {
            calls += 1;
            async { Err(crashed()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let policy = CapturePolicy::with_retries(3).initial_backoff(Duration::from_millis(1));
        let mut calls = 0;
        let result = with_backoff(&policy, "frame", || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Err(crashed())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_video_is_not_retried() {
        let policy = CapturePolicy::with_retries(5).initial_backoff(Duration::from_millis(1));
        let mut calls = 0;
        let result: Result<(), _> = with_backoff(&policy, "frame", || {
            calls += 1;
            async { Err(MediaError::VideoNotFound(PathBuf::from("gone.mp4"))) }
        })
        .await;

        assert!(matches!(result, Err(MediaError::VideoNotFound(_))));
        assert_eq!(calls, 1);
    }
}
