//! Token bucket rate limiter for per-indexer rate limiting.
//!
//! One bucket per indexer, owned by a single pool and mutated only under its
//! lock, so RSS sync and concurrent searches draw from the same budget.

use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use crate::config::IndexerConfig;

/// Token bucket rate limiter for a single indexer.
///
/// Tokens are added at a constant rate and consumed when requests are made.
pub struct TokenBucket {
    /// Max tokens (= requests per minute).
    capacity: f32,
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    last_refill: Instant,
}

impl TokenBucket {
    /// The bucket starts full, allowing a burst up to the capacity.
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute.max(1) as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Try to acquire a token.
    ///
    /// Returns `Err(wait_duration)` if rate limited, with the duration to wait.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            let wait_secs = tokens_needed / self.refill_rate;
            Err(Duration::from_secs_f32(wait_secs))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Pool of rate limiters, one per indexer.
pub struct RateLimiterPool {
    limiters: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiterPool {
    pub fn new(indexers: &[IndexerConfig]) -> Self {
        let limiters = indexers
            .iter()
            .map(|i| (i.name.clone(), TokenBucket::new(i.rate_limit_rpm)))
            .collect();
        Self {
            limiters: Mutex::new(limiters),
        }
    }

    pub fn empty() -> Self {
        Self {
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a token, waiting for the bucket to refill when it is empty.
    ///
    /// Indexers without a bucket are unlimited. Returns the time spent waiting.
    pub async fn acquire(&self, indexer: &str) -> Duration {
        let mut waited = Duration::ZERO;
        loop {
            let wait = {
                let mut limiters = self.limiters.lock().await;
                match limiters.get_mut(indexer) {
                    Some(bucket) => match bucket.try_acquire() {
                        Ok(()) => return waited,
                        Err(wait) => wait,
                    },
                    None => return waited,
                }
            };
            debug!(
                indexer = %indexer,
                wait_ms = wait.as_millis() as u64,
                "Rate limited, queueing request"
            );
            sleep(wait).await;
            waited += wait;
        }
    }
}
