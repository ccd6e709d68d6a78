//! Deterministic indicator math used by trend classification and Screen 2
//! (spec §3 TrendClassification, §4.3). Hand-rolled: no crate in the
//! reference corpus ships Elder-style EMA/RSI/MACD/ADX for this domain, so
//! these follow the teacher's `utils/maths_utils.rs` style (free
//! functions over `&[f64]`, `#[inline]` on the hot loops) rather than
//! reaching for an unrelated TA crate.

mod adx;
mod ema;
mod macd;
mod rsi;

pub use adx::adx;
pub use ema::ema_series;
pub use macd::{macd_series, MacdPoint};
pub use rsi::rsi;
