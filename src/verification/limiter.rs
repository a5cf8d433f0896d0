//! Sliding-window rate limiter shared by every probe of a run.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Allows at most `max_calls` starts within any `period`.
///
/// Callers beyond the budget sleep until the oldest start leaves the window.
/// Share one instance (behind an `Arc`) to make the limit process-wide.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    period: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1) as usize,
            period,
            starts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn per_minute(max_calls: u32) -> Self {
        Self::new(max_calls, Duration::from_secs(60))
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Takes a slot without waiting; `None` means the caller must wait that long.
    fn try_acquire(&self) -> Option<Duration> {
        let mut starts = self.starts.lock();
        let now = Instant::now();
        while let Some(oldest) = starts.front() {
            if now.duration_since(*oldest) >= self.period {
                starts.pop_front();
            } else {
                break;
            }
        }
        if starts.len() < self.max_calls {
            starts.push_back(now);
            return None;
        }
        starts
            .front()
            .map(|oldest| self.period.saturating_sub(now.duration_since(*oldest)))
    }

    /// Waits for a slot.
    pub async fn acquire(&self) {
        while let Some(wait) = self.try_acquire() {
            tracing::debug!(target: "verification", "Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
