use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Minimum spacing between requests, shared by every summarizer instance.
///
/// Each caller reserves the next free slot under the lock and then sleeps
/// outside it, so the lock is never held across a request.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub async fn acquire(&self) {
        let wait = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next_slot = Some(slot + self.min_interval);
            slot - now
        };

        if !wait.is_zero() {
            tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate limiter delaying request");
            sleep(wait).await;
        }
    }
}
