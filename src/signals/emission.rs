use chrono::{DateTime, Utc};

use crate::config::SignalConfig;
use crate::domain::{Level, Signal, SignalStatus, ThresholdTouches, TrendClassification};
use crate::filters::Verdict;

use super::admission::direction_for;

/// Builds a new ACTIVE signal for an admitted level (spec §4.4
/// "Emission"): entry = level price, stop = entry ± `stop_loss_pct`,
/// timestamp = `now`, with the Elder-screens verdict snapshotted onto it.
pub fn emit(level: &Level, current_trend: TrendClassification, verdict: &Verdict, cfg: &SignalConfig, now: DateTime<Utc>) -> Signal {
    let direction = direction_for(level);
    let entry_price = level.price;
    let stop_loss = Signal::stop_loss_for(direction, entry_price, *cfg.stop_loss_pct);

    Signal {
        id: 0,
        pair_symbol: level.pair_symbol.clone(),
        direction,
        level_price: level.price,
        entry_price,
        stop_loss,
        timestamp: now,
        trend_at_emission: current_trend,
        level_type: level.level_type,
        level_timeframe: level.timeframe,
        test_count: level.live_test_count,
        status: SignalStatus::Active,
        exit_price: None,
        exit_timestamp: None,
        exit_reason: None,
        max_favorable_move_pct: 0.0,
        max_adverse_move_pct: 0.0,
        threshold_touches: ThresholdTouches::default(),
        elder_screens_snapshot: verdict.clone(),
        result_fixed: None,
        result_fixed_at: None,
        archived: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CachedVerdict, Direction, LevelType, ScoreBreakdown, Timeframe};

    fn level() -> Level {
        Level {
            id: 5,
            pair_symbol: "ETH/USDT".into(),
            price: 3000.0,
            level_type: LevelType::Resistance,
            timeframe: Timeframe::H1,
            historical_touches: 3,
            live_test_count: 1,
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
    fn resistance_emits_short_with_stop_above_entry() {
        let cfg = SignalConfig::default();
        let lvl = level();
        let sig = emit(&lvl, TrendClassification::DownWeak, &Verdict::default(), &cfg, Utc::now());
        assert_eq!(sig.direction, Direction::Short);
        assert!(sig.is_stop_side_valid());
        assert!((sig.stop_loss - sig.entry_price) / sig.entry_price - *cfg.stop_loss_pct < 1e-9);
    }
}
