//! Per-host rate limiting for HTTP requests.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Per-host rate limiter.
///
/// Concurrent sensor tasks hit the same host at once; each caller reserves
/// the next free slot for its host and sleeps until then.
pub struct RateLimiter {
    min_delay: Duration,
    /// Next instant a request to the host may start.
    next_slot: DashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            next_slot: DashMap::new(),
        }
    }

    /// Wait if necessary before making a request to this host.
    pub async fn wait(&self, host: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        let now = Instant::now();
        let slot = {
            let mut entry = self.next_slot.entry(host.to_string()).or_insert(now);
            let slot = (*entry).max(now);
            *entry = slot + self.min_delay;
            slot
        };

        if slot > now {
            tracing::trace!(host, wait_ms = %(slot - now).as_millis(), "rate limited");
            sleep_until(slot).await;
        }
    }

    pub fn tracked_hosts(&self) -> usize {
        self.next_slot.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}
