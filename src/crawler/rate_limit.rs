//! Fixed politeness delay between live requests

use std::time::Duration;

/// Sleeps a fixed delay after every live fetch
///
/// One delay value applies to every host. Cache hits never reach the limiter,
/// so a run served entirely from the cache never sleeps.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    delay: Duration,
    waits: u64,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay, waits: 0 }
    }

    /// The configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of times [`wait_if_needed`](Self::wait_if_needed) has run
    pub fn waits(&self) -> u64 {
        self.waits
    }

    /// Pauses for the configured delay; called once per live fetch
    pub async fn wait_if_needed(&mut self) {
        self.waits += 1;
        if self.delay.is_zero() {
            return;
        }
        tracing::info!("Sleeping {:?} before the next request", self.delay);
        tokio::time::sleep(self.delay).await;
    }
}
