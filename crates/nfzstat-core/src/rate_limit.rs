//! Fixed inter-request delay

use std::time::Duration;

/// Default pause after each request (200ms)
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

/// Sleeps a fixed delay after every completed request.
///
/// No adaptive backoff: the API has no documented limit and a constant pause
/// keeps tens of thousands of sequential requests under its tolerance.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// No-op limiter (tests, local mirrors)
    pub const fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Block the calling thread for the configured delay
    pub fn wait(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}
