use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tracing::warn;

/// Weight-based token bucket over a rolling wall-clock minute, fronting
/// the exchange client (spec §5 "a token-bucket rate limiter fronts the
/// exchange client").
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    used_weight: u32,
    current_minute_idx: u64,
    limit: u32,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                used_weight: 0,
                current_minute_idx: Self::current_minute_idx(),
                limit: limit_per_minute,
            })),
        }
    }

    /// Blocks until `cost` weight can be spent this minute, resetting the
    /// bucket on minute rollover and sleeping until `:00` when saturated.
    pub async fn acquire(&self, cost: u32, context: &str) {
        loop {
            let wait = {
                let mut guard = self.inner.lock().await;
                let now_idx = Self::current_minute_idx();

                if now_idx > guard.current_minute_idx {
                    guard.used_weight = 0;
                    guard.current_minute_idx = now_idx;
                }

                if guard.used_weight + cost <= guard.limit {
                    guard.used_weight += cost;
                    return;
                }

                let now_secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs();
                let seconds_into_minute = now_secs % 60;
                Duration::from_secs(60 - seconds_into_minute) + Duration::from_millis(100)
            };

            warn!(context, wait_secs = wait.as_secs(), "exchange rate limit saturated, waiting for next minute");
            tokio::time::sleep(wait).await;
        }
    }

    fn current_minute_idx() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs() / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquiring_within_budget_never_waits() {
        let limiter = RateLimiter::new(100);
        limiter.acquire(40, "test").await;
        limiter.acquire(40, "test").await;
    }
}
