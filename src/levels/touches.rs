use chrono::{DateTime, Utc};

use crate::domain::Candle;

/// Count of bars in `candles` where high/low/close comes within
/// `tolerance_pct` of `level_price` (spec §4.2 "Touch counting",
/// `historical_touches`). Run once, at discovery, over the cooling-off
/// window.
pub fn count_historical_touches(candles: &[Candle], level_price: f64, tolerance_pct: f64) -> u32 {
    if level_price <= 0.0 {
        return 0;
    }
    candles.iter().filter(|c| c.touches(level_price, tolerance_pct)).count() as u32
}

/// Whether a fresh live observation of `current_price` against
/// `level_price` both touches the level and is far enough in time from
/// `last_touch` to count as a distinct test (spec §4.2 "live_test_count";
/// "each new observation closer than 5 min to the previous one counts as
/// one test").
pub fn is_new_live_test(
    level_price: f64,
    current_price: f64,
    tolerance_pct: f64,
    last_touch: DateTime<Utc>,
    now: DateTime<Utc>,
    min_interval_minutes: i64,
) -> bool {
    if level_price <= 0.0 {
        return false;
    }
    let diff = (current_price - level_price).abs() / level_price;
    if diff > tolerance_pct {
        return false;
    }
    (now - last_touch).num_minutes() >= min_interval_minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candle(h: f64, l: f64, c: f64) -> Candle {
        Candle::new(0, c, h, l, c, 1.0)
    }

    #[test]
    fn counts_bars_touching_within_tolerance() {
        let candles = vec![
            candle(100.3, 99.7, 100.0), // touches 100.0 within 0.3%
            candle(105.0, 104.0, 104.5), // no touch
            candle(100.2, 99.9, 100.1), // touches
        ];
        assert_eq!(count_historical_touches(&candles, 100.0, 0.003), 2);
    }

    #[test]
    fn new_live_test_requires_both_proximity_and_spacing() {
        let now = Utc::now();
        let recent = now - Duration::minutes(2);
        let old = now - Duration::minutes(10);

        assert!(!is_new_live_test(100.0, 100.1, 0.004, recent, now, 5));
        assert!(is_new_live_test(100.0, 100.1, 0.004, old, now, 5));
        assert!(!is_new_live_test(100.0, 110.0, 0.004, old, now, 5));
    }
}
