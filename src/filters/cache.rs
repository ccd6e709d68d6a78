use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::Verdict;

/// Key-scoped cache of Elder-screens verdicts with absolute per-entry
/// expiry, generalising the teacher's `GlobalRateLimiter`'s
/// `Arc<Mutex<Inner>>` pattern (`data/rate_limiter.rs`) from a single
/// shared counter to many independently-expiring entries. No global lock
/// is held across an `.await`; each call takes the lock only to read or
/// replace one entry (spec §5 "per-key update-on-read semantics").
#[derive(Clone)]
pub struct VerdictCache {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

struct Entry {
    verdict: Verdict,
    computed_at: DateTime<Utc>,
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl VerdictCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache key is (pair, level price, timeframe, direction) collapsed
    /// to a string — levels are merged/evicted by price so a formatted key
    /// is stable enough for the 60s/5min windows this cache serves.
    pub fn key(pair_symbol: &str, level_price: f64, direction: &str) -> String {
        format!("{pair_symbol}|{level_price:.8}|{direction}")
    }

    /// Returns the cached verdict if it is still fresh for `max_age`.
    pub async fn get(&self, key: &str, max_age: Duration) -> Option<Verdict> {
        let guard = self.inner.lock().await;
        let entry = guard.get(key)?;
        if Utc::now() - entry.computed_at <= max_age {
            Some(entry.verdict.clone())
        } else {
            None
        }
    }

    pub async fn put(&self, key: String, verdict: Verdict) {
        let mut guard = self.inner.lock().await;
        guard.insert(
            key,
            Entry {
                verdict,
                computed_at: Utc::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{CheckResult, Screen1Result};

    fn sample_verdict() -> Verdict {
        Verdict::compose(
            Screen1Result {
                btc_market_trend: CheckResult::pass("ok"),
                pair_trend: CheckResult::pass("ok"),
            },
            None,
            CheckResult::pass("ok"),
        )
    }

    #[tokio::test]
    async fn stores_and_expires_per_key() {
        let cache = VerdictCache::new();
        let key = VerdictCache::key("BTC/USDT", 60_000.0, "LONG");
        cache.put(key.clone(), sample_verdict()).await;

        assert!(cache.get(&key, Duration::seconds(60)).await.is_some());
        assert!(cache.get(&key, Duration::seconds(-1)).await.is_none());
        assert!(cache.get("missing", Duration::seconds(60)).await.is_none());
    }
}
