use crate::domain::{Candle, LevelType};

const RECENT_BAR_WINDOW: usize = 20;
const AGGRESSIVE_DRIFT_PCT: f64 = 0.02;

/// Whether a level is "broken" (spec §4.2 "Level breakage"): the current
/// price is beyond `break_tolerance_pct` on the wrong side, any bar in the
/// last 20 closed beyond that tolerance, or price has drifted more than 2%
/// past the level. Broken levels are deleted, never merely deactivated.
pub fn is_broken(level_type: LevelType, level_price: f64, current_price: f64, recent_candles: &[Candle], break_tolerance_pct: f64) -> bool {
    if level_price <= 0.0 {
        return false;
    }

    if current_break(level_type, level_price, current_price, break_tolerance_pct) {
        return true;
    }

    let drift_pct = (current_price - level_price).abs() / level_price;
    match level_type {
        LevelType::Support if current_price < level_price && drift_pct > AGGRESSIVE_DRIFT_PCT => return true,
        LevelType::Resistance if current_price > level_price && drift_pct > AGGRESSIVE_DRIFT_PCT => return true,
        _ => {}
    }

    let window_start = recent_candles.len().saturating_sub(RECENT_BAR_WINDOW);
    let window = &recent_candles[window_start..];
    window.iter().any(|c| match level_type {
        LevelType::Support => c.low < level_price * (1.0 - break_tolerance_pct) || c.close < level_price * (1.0 - break_tolerance_pct),
        LevelType::Resistance => c.high > level_price * (1.0 + break_tolerance_pct) || c.close > level_price * (1.0 + break_tolerance_pct),
    })
}

fn current_break(level_type: LevelType, level_price: f64, current_price: f64, tolerance_pct: f64) -> bool {
    match level_type {
        LevelType::Support => (level_price - current_price) / level_price > tolerance_pct,
        LevelType::Resistance => (current_price - level_price) / level_price > tolerance_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_candles(n: usize, price: f64) -> Vec<Candle> {
        (0..n).map(|i| Candle::new(i as i64, price, price + 0.1, price - 0.1, price, 1.0)).collect()
    }

    #[test]
    fn support_breaks_on_half_percent_drop() {
        let candles = flat_candles(20, 100.0);
        assert!(is_broken(LevelType::Support, 100.0, 99.4, &candles, 0.005));
        assert!(!is_broken(LevelType::Support, 100.0, 99.8, &candles, 0.005));
    }

    #[test]
    fn resistance_breaks_on_half_percent_rise() {
        let candles = flat_candles(20, 100.0);
        assert!(is_broken(LevelType::Resistance, 100.0, 100.6, &candles, 0.005));
    }

    #[test]
    fn historical_break_in_recent_window_counts() {
        let mut candles = flat_candles(19, 100.0);
        candles.push(Candle::new(19, 100.0, 100.1, 99.3, 99.4, 1.0));
        assert!(is_broken(LevelType::Support, 100.0, 100.0, &candles, 0.005));
    }
}
