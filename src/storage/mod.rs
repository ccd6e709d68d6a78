//! Persistence seam for the five logical tables named in spec §6:
//! trading_pairs, ohlcv, levels, signals, signal_live_logs.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;

use crate::domain::{Candle, Level, Pair, Signal, Timeframe};

#[async_trait]
pub trait Storage: Send + Sync {
    async fn initialize(&self) -> anyhow::Result<()>;

    // -- trading_pairs --
    async fn load_pairs(&self) -> anyhow::Result<Vec<Pair>>;
    async fn upsert_pair(&self, pair: &Pair) -> anyhow::Result<()>;

    // -- ohlcv --
    async fn insert_candles(&self, symbol: &str, timeframe: Timeframe, candles: &[Candle]) -> anyhow::Result<u64>;
    async fn upsert_open_candle(&self, symbol: &str, timeframe: Timeframe, candle: &Candle) -> anyhow::Result<()>;
    async fn load_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_ms: Option<i64>,
    ) -> anyhow::Result<Vec<Candle>>;

    // -- levels --
    async fn load_levels(&self, symbol: &str, timeframe: Timeframe) -> anyhow::Result<Vec<Level>>;
    async fn upsert_level(&self, level: &Level) -> anyhow::Result<()>;
    async fn delete_level(&self, level_id: &str) -> anyhow::Result<()>;

    // -- signals --
    async fn insert_signal(&self, signal: &Signal) -> anyhow::Result<()>;
    async fn update_signal(&self, signal: &Signal) -> anyhow::Result<()>;
    async fn load_open_signals(&self) -> anyhow::Result<Vec<Signal>>;
    async fn load_recent_signals(&self, symbol: &str, since_ms: i64) -> anyhow::Result<Vec<Signal>>;

    // -- signal_live_logs --
    async fn log_event(&self, signal_id: &str, event: &str, detail: &str, ts_ms: i64) -> anyhow::Result<()>;
}
