use crate::config::SignalConfig;
use crate::domain::{Direction, Level};

/// Whether a level becomes signal-eligible in the current scan (spec
/// §4.4 "Admission"): either a fresh, cache-still-valid Elder-screens pass
/// with price close enough to be "ready", or a live touch while the
/// screens pass. Breakout-only approaches never admit — only retest/bounce
/// setups do (spec §4.4).
pub fn is_admitted(level: &Level, current_price: f64, elder_screens_pass: bool, is_live_touch: bool, cfg: &SignalConfig) -> bool {
    if !elder_screens_pass {
        return false;
    }

    let distance_pct = level.distance_pct(current_price);

    let ready = distance_pct <= *cfg.ready_distance_pct;
    let touched_and_close = is_live_touch && distance_pct <= *cfg.touch_distance_pct;

    ready || touched_and_close
}

/// Support levels admit LONG, resistance levels admit SHORT (spec §4.4
/// "Direction is derived from level type").
pub fn direction_for(level: &Level) -> Direction {
    level.level_type.direction()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CachedVerdict, LevelType, ScoreBreakdown, Timeframe};
    use chrono::Utc;

    fn level(price: f64) -> Level {
        Level {
            id: 1,
            pair_symbol: "BTC/USDT".into(),
            price,
            level_type: LevelType::Support,
            timeframe: Timeframe::H1,
            historical_touches: 3,
            live_test_count: 0,
            score: ScoreBreakdown::default(),
            created_at: Utc::now(),
            first_touch: Utc::now(),
            last_touch: Utc::now(),
            is_active: true,
            last_verdict: Option::<CachedVerdict>::None,
            signal_generated: false,
        }
    }

    #[test]
    fn ready_distance_admits_without_a_live_touch() {
        let cfg = SignalConfig::default();
        let lvl = level(100.0);
        assert!(is_admitted(&lvl, 100.3, true, false, &cfg));
    }

    #[test]
    fn elder_screens_failing_always_blocks() {
        let cfg = SignalConfig::default();
        let lvl = level(100.0);
        assert!(!is_admitted(&lvl, 100.0, false, true, &cfg));
    }

    #[test]
    fn far_away_without_touch_does_not_admit() {
        let cfg = SignalConfig::default();
        let lvl = level(100.0);
        assert!(!is_admitted(&lvl, 102.0, true, false, &cfg));
    }
}
