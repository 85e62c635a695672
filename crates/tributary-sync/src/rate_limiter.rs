//! Request-rate pacing for external source calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Token bucket paced against the source API.
///
/// One token is taken per outbound request (page listing or permission
/// fetch). Scope workers share a single bucket so the aggregate rate stays
/// within the source's limit regardless of concurrency.
pub struct RateLimiter {
    capacity: u64,
    tokens: AtomicU64,
    refill_amount: u64,
    refill_interval: Duration,
    last_refill: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a bucket with explicit capacity and refill schedule.
    #[must_use]
    pub fn new(capacity: u64, refill_amount: u64, refill_interval: Duration) -> Self {
        Self {
            capacity,
            tokens: AtomicU64::new(capacity),
            refill_amount,
            refill_interval,
            last_refill: Mutex::new(Instant::now()),
        }
    }

    /// A bucket allowing a sustained N requests per second, with burst
    /// capacity of one second's worth.
    #[must_use]
    pub fn per_second(requests_per_second: u64) -> Self {
        let rate = requests_per_second.max(1);
        Self::new(rate, rate, Duration::from_secs(1))
    }

    /// Take one token if available.
    pub async fn try_acquire(&self) -> bool {
        self.refill().await;

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .tokens
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Take one token, waiting for a refill when the bucket is drained.
    pub async fn acquire(&self) {
        while !self.try_acquire().await {
            tokio::time::sleep(self.refill_interval / 10).await;
        }
    }

    /// Currently available tokens.
    pub fn available(&self) -> u64 {
        self.tokens.load(Ordering::Relaxed)
    }

    async fn refill(&self) {
        let mut last_refill = self.last_refill.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);

        if elapsed >= self.refill_interval {
            let intervals = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64();
            let new_tokens = (intervals as u64) * self.refill_amount;

            if new_tokens > 0 {
                loop {
                    let current = self.tokens.load(Ordering::Relaxed);
                    let next = (current + new_tokens).min(self.capacity);
                    if self
                        .tokens
                        .compare_exchange(current, next, Ordering::SeqCst, Ordering::Relaxed)
                        .is_ok()
                    {
                        break;
                    }
                }
                *last_refill = now;
            }
        }
    }
}
