use super::Timeframe;

/// One OHLCV bar, keyed by (symbol, timeframe, bucket-start).
///
/// A candle is **closed** once `bucket_start_ms + timeframe.duration_ms() <=
/// now`; otherwise it is the single **open** bucket for its series, the only
/// one an upsert may legitimately overwrite (see [`crate::store`]).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub bucket_start_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(bucket_start_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            bucket_start_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn bucket_end_ms(&self, timeframe: Timeframe) -> i64 {
        self.bucket_start_ms + timeframe.duration_ms()
    }

    pub fn is_closed(&self, timeframe: Timeframe, now_ms: i64) -> bool {
        self.bucket_end_ms(timeframe) <= now_ms
    }

    /// Whether `price` is within `tolerance_pct` (fractional, e.g. 0.003 for
    /// 0.3%) of this bar's high, low, or close — the touch-detection
    /// predicate shared by historical and live touch counting (§4.2).
    pub fn touches(&self, price: f64, tolerance_pct: f64) -> bool {
        let band = price * tolerance_pct;
        let near = |v: f64| (v - price).abs() <= band;
        near(self.high) || near(self.low) || near(self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_iff_bucket_end_in_the_past() {
        let c = Candle::new(0, 1.0, 1.0, 1.0, 1.0, 0.0);
        assert!(!c.is_closed(Timeframe::M15, 100));
        assert!(c.is_closed(Timeframe::M15, Timeframe::M15.duration_ms()));
    }

    #[test]
    fn touches_checks_high_low_close_within_band() {
        let c = Candle::new(0, 100.0, 101.0, 99.0, 100.2, 10.0);
        assert!(c.touches(100.0, 0.003));
        assert!(!c.touches(90.0, 0.003));
    }
}
