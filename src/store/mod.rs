//! C1 — the OHLCV Store (spec §4.1). Serves a contiguous, fresh-tailed
//! candle window per (symbol, timeframe), backfilling on miss and
//! repairing interior gaps, while guaranteeing closed candles are never
//! rewritten.

mod gap;

pub use gap::GapSpan;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{Candle, Timeframe};
use crate::exchange::ExchangeClient;
use crate::storage::Storage;

/// (symbol, timeframe) key for the per-series ingest guard, preventing two
/// concurrent backfills of the same series (supplemented from
/// `original_source/core/ohlcv_store.py`'s sync-in-progress tracking, §3.1
/// SPEC_FULL).
type SeriesKey = (String, Timeframe);

pub struct OhlcvStore {
    storage: Arc<dyn Storage>,
    exchange: Arc<dyn ExchangeClient>,
    series_guards: Mutex<HashMap<SeriesKey, Arc<Mutex<()>>>>,
    chunk_size: u32,
}

impl OhlcvStore {
    pub fn new(storage: Arc<dyn Storage>, exchange: Arc<dyn ExchangeClient>) -> Self {
        Self {
            storage,
            exchange,
            series_guards: Mutex::new(HashMap::new()),
            chunk_size: 1000,
        }
    }

    async fn guard_for(&self, symbol: &str, timeframe: Timeframe) -> Arc<Mutex<()>> {
        let mut guards = self.series_guards.lock().await;
        guards
            .entry((symbol.to_string(), timeframe))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Serve up to `limit` most recent candles, ascending by time. The
    /// last element is always freshly refreshed from upstream; earlier
    /// elements are closed and immutable (spec §4.1).
    pub async fn get_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle> {
        let guard = self.guard_for(symbol, timeframe).await;
        let _lock = guard.lock().await;

        let mut candles = match self.storage.load_candles(symbol, timeframe, None).await {
            Ok(c) => c,
            Err(e) => {
                warn!(%symbol, %timeframe, error = %e, "storage read failed, serving empty");
                Vec::new()
            }
        };

        if candles.len() < limit {
            if let Err(e) = self.backfill_tail(symbol, timeframe, limit, &mut candles).await {
                warn!(%symbol, %timeframe, error = %e, "upstream backfill failed");
            }
        } else if let Some(gap) = self.first_interior_gap(&candles, timeframe) {
            debug!(%symbol, %timeframe, ?gap, "interior gap detected, filling");
            if let Err(e) = self.fill_gap(symbol, timeframe, gap, &mut candles).await {
                warn!(%symbol, %timeframe, error = %e, "gap fill failed");
            }
        }

        if let Err(e) = self.refresh_open_candle(symbol, timeframe, &mut candles).await {
            warn!(%symbol, %timeframe, error = %e, "open-candle refresh failed");
        }

        let start = candles.len().saturating_sub(limit);
        candles[start..].to_vec()
    }

    /// Candles with `bucket_start_ms >= since_ts`, ascending.
    pub async fn get_candles_since(&self, symbol: &str, timeframe: Timeframe, since_ts: i64) -> Vec<Candle> {
        match self.storage.load_candles(symbol, timeframe, Some(since_ts)).await {
            Ok(c) => c,
            Err(e) => {
                warn!(%symbol, %timeframe, error = %e, "storage read failed, serving empty");
                Vec::new()
            }
        }
    }

    async fn backfill_tail(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        candles: &mut Vec<Candle>,
    ) -> anyhow::Result<()> {
        let missing = limit - candles.len();
        let fetch_limit = (missing as u32).max(1).min(self.chunk_size);
        let since_ms = candles.first().map(|c| c.bucket_start_ms - (fetch_limit as i64) * timeframe.duration_ms());

        let raw = self
            .exchange
            .fetch_ohlcv(symbol, timeframe, since_ms, Some(fetch_limit))
            .await?;
        let fetched: Vec<Candle> = raw.into_iter().map(Into::into).collect();
        if !fetched.is_empty() {
            self.storage.insert_candles(symbol, timeframe, &fetched).await?;
            *candles = self.storage.load_candles(symbol, timeframe, None).await?;
        }
        Ok(())
    }

    /// Detects the first interior gap wider than 1.5x the timeframe
    /// duration (spec §4.1). Linear scan, runs once per call.
    fn first_interior_gap(&self, candles: &[Candle], timeframe: Timeframe) -> Option<GapSpan> {
        gap::first_interior_gap(candles, timeframe)
    }

    async fn fill_gap(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        gap: GapSpan,
        candles: &mut Vec<Candle>,
    ) -> anyhow::Result<()> {
        let raw = self
            .exchange
            .fetch_ohlcv(symbol, timeframe, Some(gap.from_ms), Some(self.chunk_size))
            .await?;
        let fetched: Vec<Candle> = raw
            .into_iter()
            .map(Into::into)
            .filter(|c: &Candle| c.bucket_start_ms < gap.to_ms)
            .collect();
        if !fetched.is_empty() {
            self.storage.insert_candles(symbol, timeframe, &fetched).await?;
            *candles = self.storage.load_candles(symbol, timeframe, None).await?;
        }
        Ok(())
    }

    /// Refreshes (or appends) the single open bucket from upstream. This
    /// is the only legitimate overwrite of a stored row in steady state
    /// (spec §4.1 "Closed-candle immutability").
    async fn refresh_open_candle(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &mut Vec<Candle>,
    ) -> anyhow::Result<()> {
        let now_ms = Utc::now().timestamp_millis();
        let raw = self.exchange.fetch_ohlcv(symbol, timeframe, None, Some(1)).await?;
        let Some(latest) = raw.into_iter().next().map(Candle::from) else {
            return Ok(());
        };

        match candles.last() {
            Some(last) if last.bucket_start_ms == latest.bucket_start_ms => {
                if !last.is_closed(timeframe, now_ms) {
                    self.storage.upsert_open_candle(symbol, timeframe, &latest).await?;
                    *candles.last_mut().unwrap() = latest;
                }
            }
            _ => {
                self.storage.insert_candles(symbol, timeframe, &[latest]).await?;
                candles.push(latest);
            }
        }
        Ok(())
    }

    /// Guarantees at least 80% of expected candle count across `days` of
    /// history (spec §4.1 "Historical backfill"), fetching in
    /// rate-limited batches.
    pub async fn ensure_history(&self, symbol: &str, timeframe: Timeframe, days: i64) -> anyhow::Result<()> {
        let expected = (days * 86_400_000) / timeframe.duration_ms();
        let have = self
            .storage
            .load_candles(symbol, timeframe, None)
            .await?
            .len() as i64;

        if have as f64 >= expected as f64 * 0.8 {
            return Ok(());
        }

        let since_ms = Utc::now().timestamp_millis() - days * 86_400_000;
        let mut cursor = since_ms;
        loop {
            let raw = self
                .exchange
                .fetch_ohlcv(symbol, timeframe, Some(cursor), Some(self.chunk_size))
                .await?;
            if raw.is_empty() {
                break;
            }
            let last_ts = raw.last().map(|c| c.open_time_ms).unwrap_or(cursor);
            let fetched: Vec<Candle> = raw.into_iter().map(Into::into).collect();
            self.storage.insert_candles(symbol, timeframe, &fetched).await?;

            if last_ts <= cursor || fetched.len() < self.chunk_size as usize {
                break;
            }
            cursor = last_ts + timeframe.duration_ms();
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Candle;

    #[test]
    fn interior_gap_detection_finds_wide_gaps() {
        let tf = Timeframe::M15;
        let step = tf.duration_ms();
        let candles = vec![
            Candle::new(0, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(step, 1.0, 1.0, 1.0, 1.0, 0.0),
            // gap: skips 2 buckets, wider than 1.5x
            Candle::new(step * 4, 1.0, 1.0, 1.0, 1.0, 0.0),
        ];
        let gap = gap::first_interior_gap(&candles, tf).expect("expected a gap");
        assert_eq!(gap.from_ms, step);
        assert_eq!(gap.to_ms, step * 4);
    }

    #[test]
    fn no_gap_when_contiguous() {
        let tf = Timeframe::M15;
        let step = tf.duration_ms();
        let candles = vec![
            Candle::new(0, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(step, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(step * 2, 1.0, 1.0, 1.0, 1.0, 0.0),
        ];
        assert!(gap::first_interior_gap(&candles, tf).is_none());
    }
}
