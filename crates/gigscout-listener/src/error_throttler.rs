// Exponential backoff (1s doubling up to 60s) for the bot's long-poll loop.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MIN_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Each failed poll waits twice as long as the previous one, capped at
/// `max`. A successful poll calls `reset`.
pub struct ErrorThrottler {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl ErrorThrottler {
    pub fn new() -> Self {
        Self::with_bounds(MIN_BACKOFF, MAX_BACKOFF)
    }

    pub fn with_bounds(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            current: min,
        }
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }

    pub fn current_delay(&self) -> Duration {
        self.current
    }

    /// Sleep for the current delay, then double it.
    ///
    /// Returns `false` if `cancel` fired during the sleep.
    pub async fn increment_and_wait(&mut self, cancel: CancellationToken) -> bool {
        let delay = self.current;
        tracing::warn!("Backing off for {:.1}s before the next poll", delay.as_secs_f64());
        self.increment();

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }

    pub fn increment(&mut self) {
        self.current = self.current.saturating_mul(2).min(self.max);
    }
}

impl Default for ErrorThrottler {
    fn default() -> Self {
        Self::new()
    }
}
