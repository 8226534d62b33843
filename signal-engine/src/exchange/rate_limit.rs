//! Minimum-interval rate limiter shared by concurrent requests

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// Hands out request slots at least `min_interval` apart. Concurrent callers
/// queue up behind each other instead of bursting.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(Duration::from_secs(60) / requests_per_minute.max(1))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until this caller's slot comes up
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.min_interval;
            slot
        };
        sleep_until(slot).await;
    }
}
