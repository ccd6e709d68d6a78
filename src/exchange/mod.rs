//! The exchange client is an external collaborator, described only by its
//! interface (spec §1, §6). `ExchangeClient` is the seam; [`BinanceClient`]
//! documents the concrete REST/weight model the teacher's
//! `config::binance::BinanceConfig` already encodes, without performing
//! speculative network I/O beyond what the trait needs to be exercised.

mod binance;
mod rate_limiter;

pub use binance::BinanceClient;
pub use rate_limiter::RateLimiter;

use async_trait::async_trait;

use crate::domain::{Candle, Timeframe};

/// One upstream OHLCV bar as returned by an exchange, pre-domain-mapping.
#[derive(Debug, Clone, Copy)]
pub struct RawCandle {
    pub open_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<RawCandle> for Candle {
    fn from(r: RawCandle) -> Self {
        Candle::new(r.open_time_ms, r.open, r.high, r.low, r.close, r.volume)
    }
}

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch up to `limit` candles for `symbol`/`timeframe`, optionally
    /// starting from `since_ms` (spec §6).
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: Option<i64>,
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<RawCandle>>;

    async fn fetch_ticker(&self, symbol: &str) -> anyhow::Result<f64>;
}
