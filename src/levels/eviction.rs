use chrono::{DateTime, Utc};
use strum_macros::Display;

use crate::config::LevelConfig;
use crate::domain::{Candle, Level};

use super::breakage::is_broken;

/// Why a level was evicted (spec §3 "A level is evicted when any of...").
/// Levels are deleted outright on any of these, never merely deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EvictionReason {
    #[strum(to_string = "broken")]
    Broken,
    #[strum(to_string = "max_live_tests_reached")]
    MaxLiveTests,
    #[strum(to_string = "max_age_exceeded")]
    MaxAge,
    #[strum(to_string = "max_distance_exceeded")]
    MaxDistance,
}

/// The first eviction reason that applies to `level`, if any (spec §3, §8
/// "When `live_test_count == max_live_tests`, L is evicted within one
/// cleanup cycle").
pub fn eviction_reason(level: &Level, current_price: f64, recent_candles: &[Candle], cfg: &LevelConfig, now: DateTime<Utc>) -> Option<EvictionReason> {
    if is_broken(level.level_type, level.price, current_price, recent_candles, *cfg.break_tolerance) {
        return Some(EvictionReason::Broken);
    }
    if level.live_test_count >= cfg.max_live_tests {
        return Some(EvictionReason::MaxLiveTests);
    }
    let age_days = (now - level.created_at).num_seconds() as f64 / 86_400.0;
    if age_days > cfg.max_age_days as f64 {
        return Some(EvictionReason::MaxAge);
    }
    if level.distance_pct(current_price) > *cfg.max_distance_pct {
        return Some(EvictionReason::MaxDistance);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CachedVerdict, LevelType, ScoreBreakdown, Timeframe};

    fn sample_level(price: f64, live_test_count: u32, created_at: DateTime<Utc>) -> Level {
        Level {
            id: 1,
            pair_symbol: "BTC/USDT".into(),
            price,
            level_type: LevelType::Support,
            timeframe: Timeframe::H1,
            historical_touches: 3,
            live_test_count,
            score: ScoreBreakdown::default(),
            created_at,
            first_touch: created_at,
            last_touch: created_at,
            is_active: true,
            last_verdict: Option::<CachedVerdict>::None,
            signal_generated: false,
        }
    }

    #[test]
    fn evicts_on_max_live_tests() {
        let cfg = LevelConfig::default();
        let now = Utc::now();
        let level = sample_level(100.0, cfg.max_live_tests, now);
        let candles = vec![Candle::new(0, 100.0, 100.1, 99.9, 100.0, 1.0); 20];
        assert_eq!(eviction_reason(&level, 100.0, &candles, &cfg, now), Some(EvictionReason::MaxLiveTests));
    }

    #[test]
    fn evicts_on_age() {
        let cfg = LevelConfig::default();
        let now = Utc::now();
        let old = now - chrono::Duration::days(cfg.max_age_days + 1);
        let level = sample_level(100.0, 0, old);
        let candles = vec![Candle::new(0, 100.0, 100.1, 99.9, 100.0, 1.0); 20];
        assert_eq!(eviction_reason(&level, 100.0, &candles, &cfg, now), Some(EvictionReason::MaxAge));
    }

    #[test]
    fn healthy_level_is_not_evicted() {
        let cfg = LevelConfig::default();
        let now = Utc::now();
        let level = sample_level(100.0, 1, now);
        let candles = vec![Candle::new(0, 100.0, 100.1, 99.9, 100.0, 1.0); 20];
        assert_eq!(eviction_reason(&level, 100.0, &candles, &cfg, now), None);
    }
}
