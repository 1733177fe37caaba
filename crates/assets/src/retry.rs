use std::time::Duration;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::path::AssetPath;
use crate::progress::ProgressTracker;
use crate::source::AssetSource;

/// Bounded exponential backoff for transient transfer failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: f32,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            multiplier: 2.0,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retrying after the `failed_attempt`-th failure (1-based).
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1) as i32;
        let ms = self.initial_backoff_ms as f64 * (self.multiplier as f64).powi(exponent);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }
}

/// Fetch `path`, retrying transient failures per `policy`.
///
/// `sleep` supplies the backoff delay so the caller decides how time passes.
pub async fn fetch_with_retry<S, F>(
    source: &S,
    path: &AssetPath,
    progress: &ProgressTracker,
    policy: &RetryPolicy,
    sleep: F,
) -> Result<Vec<u8>, AssetError>
where
    S: AssetSource + ?Sized,
    F: Fn(Duration) -> LocalBoxFuture<'static, ()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.fetch(path, progress).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if attempt >= max_attempts => {
                return Err(AssetError::Exhausted {
                    path: path.full(),
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    path = %path,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "asset transfer failed, retrying: {e}"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
