//! Rate governor: dispatch spacing and bounded throttling recovery.
//!
//! Spacing is best-effort. Each admission compares against the most recently
//! *recorded* dispatch rather than reserving a slot, so admissions that start
//! together (one queue batch) may leave closer than `min_interval`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{trace, warn};

use super::transport::TransportError;
use crate::config::GovernorConfig;

/// Why a governed dispatch ended without a value.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Every attempt was throttled.
    #[error("throttled on all {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// A non-throttling transport failure. Never retried.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Throttling retry bookkeeping for one in-flight call.
///
/// `attempt_count` never exceeds `max_attempts`; once they are equal the next
/// throttle is terminal.
#[derive(Debug, Clone, Copy)]
pub struct RetryState {
    attempt_count: u32,
    max_attempts: u32,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt_count: 0,
            max_attempts,
        }
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }

    /// Record a throttling response.
    ///
    /// Returns the retry index to back off for (0 for the first retry), or
    /// `None` if no retries remain.
    pub fn on_throttled(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        let index = self.attempt_count;
        self.attempt_count += 1;
        Some(index)
    }
}

/// Process-wide spacing state plus retry policy.
pub struct RateGovernor {
    config: GovernorConfig,
    last_dispatch: Mutex<Option<Instant>>,
    dispatches: AtomicU64,
    throttled_retries: AtomicU64,
}

impl RateGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            last_dispatch: Mutex::new(None),
            dispatches: AtomicU64::new(0),
            throttled_retries: AtomicU64::new(0),
        }
    }

    /// Wait until `min_interval` has passed since the last recorded dispatch,
    /// then record this one.
    ///
    /// Only the calling task is suspended.
    pub async fn admit(&self) {
        if let Some(wait) = self.spacing_wait(Instant::now()) {
            trace!(wait_ms = wait.as_millis() as u64, "Spacing admission");
            sleep(wait).await;
        }
        self.record_dispatch();
    }

    /// Mark "now" as the most recent dispatch.
    pub fn record_dispatch(&self) {
        *self.last_dispatch.lock() = Some(Instant::now());
    }

    pub fn last_dispatch(&self) -> Option<Instant> {
        *self.last_dispatch.lock()
    }

    /// Backoff before retry `index`: `base * 2^index`, capped at the maximum.
    pub fn backoff_delay(&self, index: u32) -> Duration {
        let factor = 1u64.checked_shl(index).unwrap_or(u64::MAX);
        let ms = self
            .config
            .backoff_base_ms
            .saturating_mul(factor)
            .min(self.config.backoff_max_ms);
        Duration::from_millis(ms)
    }

    /// Run `send`, retrying only on 429 with exponential backoff.
    ///
    /// At most `max_attempts + 1` attempts are made. After each backoff the
    /// dispatch timestamp is refreshed so unrelated admissions keep their
    /// spacing from the retry.
    pub async fn execute<T, F, Fut>(&self, mut send: F) -> Result<T, DispatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut retry = RetryState::new(self.config.max_attempts);
        loop {
            self.dispatches.fetch_add(1, Ordering::Relaxed);
            match send().await {
                Ok(value) => return Ok(value),
                Err(TransportError::TooManyRequests) => {
                    // Only a 429 after `max_attempts` retries is terminal, so
                    // the attempt following the last backoff still runs and
                    // 429, 429, 200 succeeds.
                    let Some(index) = retry.on_throttled() else {
                        let attempts = retry.attempt_count() + 1;
                        warn!(attempts, "Upstream still throttling; giving up");
                        return Err(DispatchError::Exhausted { attempts });
                    };
                    let delay = self.backoff_delay(index);
                    self.throttled_retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        retry = index + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream returned 429, backing off"
                    );
                    sleep(delay).await;
                    self.record_dispatch();
                }
                Err(e) => return Err(DispatchError::Transport(e)),
            }
        }
    }

    /// Total transport attempts made through [`execute`](Self::execute).
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    pub fn throttled_retry_count(&self) -> u64 {
        self.throttled_retries.load(Ordering::Relaxed)
    }

    fn spacing_wait(&self, now: Instant) -> Option<Duration> {
        let last = (*self.last_dispatch.lock())?;
        let elapsed = now.saturating_duration_since(last);
        let min = self.config.min_interval();
        (elapsed < min).then(|| min - elapsed)
    }
}
