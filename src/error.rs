//! Crate-wide error types (spec §7).
//!
//! Transient upstream failures, insufficient data, and filter rejection
//! are not exceptional — they are represented as empty results or a
//! [`crate::filters::Verdict`] (see spec §7, §9). `CoreError` exists for
//! the cases spec §7 calls "Invariant violation": conditions that should
//! never be reachable given the rest of the pipeline's checks, and which
//! abort the current pair-task rather than being silently absorbed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("would-be duplicate signal for {pair} near {price}")]
    DuplicateSignal { pair: String, price: f64 },

    #[error("stop_loss {stop} is on the wrong side of entry {entry} for {direction}")]
    InvalidStopSide {
        direction: crate::domain::Direction,
        entry: f64,
        stop: f64,
    },

    #[error("insufficient candle history for {symbol} {timeframe}: have {have}, need {need}")]
    InsufficientData {
        symbol: String,
        timeframe: String,
        have: usize,
        need: usize,
    },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}
