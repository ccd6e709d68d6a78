use chrono::{DateTime, Utc};

use crate::config::SignalConfig;
use crate::domain::{FixedResult, Signal, ThresholdTouches};

/// Recomputes MFE/MAE, per-threshold first-touch times, and the fixed
/// settlement result from a full scan of `bars` (spec §4.4 "Outcome
/// tracking" pulls the full `[entry_time, exit_time]` span from the store
/// on every update, rather than tracking incrementally — this mirrors
/// that by rescanning each time it's called). `bars` must be sorted
/// ascending by timestamp and is scanned close-only ("conservative" per
/// spec §4.4).
pub fn recompute(signal: &mut Signal, bars: &[(DateTime<Utc>, f64)], cfg: &SignalConfig) {
    let mut mfe: f64 = 0.0;
    let mut mae: f64 = 0.0;
    let mut touches = ThresholdTouches::default();
    let mut first_favourable_fixed_ts: Option<DateTime<Utc>> = None;
    let mut first_adverse_fixed_ts: Option<DateTime<Utc>> = None;

    for &(ts, close) in bars {
        let move_pct = signal.favourable_move_pct(close);
        if move_pct > mfe {
            mfe = move_pct;
        }
        if move_pct < mae {
            mae = move_pct;
        }

        if touches.first_touch_0_5_pct.is_none() && move_pct >= *cfg.mfe_thresholds_pct[0] {
            touches.first_touch_0_5_pct = Some(ts);
        }
        if touches.first_touch_1_0_pct.is_none() && move_pct >= *cfg.mfe_thresholds_pct[1] {
            touches.first_touch_1_0_pct = Some(ts);
        }
        if touches.first_touch_1_5_pct.is_none() && move_pct >= *cfg.mfe_thresholds_pct[2] {
            touches.first_touch_1_5_pct = Some(ts);
        }

        if first_favourable_fixed_ts.is_none() && move_pct >= *cfg.fixed_favourable_pct {
            first_favourable_fixed_ts = Some(ts);
        }
        if first_adverse_fixed_ts.is_none() && move_pct <= -*cfg.fixed_adverse_pct {
            first_adverse_fixed_ts = Some(ts);
        }
    }

    signal.max_favorable_move_pct = mfe;
    signal.max_adverse_move_pct = mae;
    signal.threshold_touches = touches;

    // The single settlement rule (spec §4.4 "result_fixed"): whichever of
    // the two thresholds was crossed first wins; neither crossed leaves
    // the signal unfixed.
    signal.result_fixed = match (first_favourable_fixed_ts, first_adverse_fixed_ts) {
        (Some(fav), Some(adv)) if fav <= adv => Some(FixedResult::FavourablePct(*cfg.fixed_favourable_pct)),
        (Some(_), None) => Some(FixedResult::FavourablePct(*cfg.fixed_favourable_pct)),
        (Some(_), Some(_)) => Some(FixedResult::AdversePct(-*cfg.fixed_adverse_pct)),
        (None, Some(_)) => Some(FixedResult::AdversePct(-*cfg.fixed_adverse_pct)),
        (None, None) => None,
    };
    signal.result_fixed_at = match signal.result_fixed {
        Some(FixedResult::FavourablePct(_)) => first_favourable_fixed_ts,
        Some(FixedResult::AdversePct(_)) => first_adverse_fixed_ts,
        None => None,
    };
}

/// For very short, losing trades the close-only scan can't reliably claim
/// a favourable excursion ever happened; pin MFE to 0 (spec §4.4 "For
/// very short trades (< 60s) that exited in loss, MFE is pinned to 0").
/// Call after `exit_price`/`exit_timestamp` are set.
pub fn pin_mfe_for_short_losing_trade(signal: &mut Signal, cfg: &SignalConfig) {
    let Some(exit_ts) = signal.exit_timestamp else { return };
    let Some(exit_price) = signal.exit_price else { return };

    let duration_secs = (exit_ts - signal.timestamp).num_seconds();
    let is_loss = signal.favourable_move_pct(exit_price) < 0.0;

    if duration_secs < cfg.short_trade_floor_secs && is_loss {
        signal.max_favorable_move_pct = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason, LevelType, SignalStatus, Timeframe};
    use crate::filters::Verdict;
    use chrono::Duration;

    fn base_signal() -> Signal {
        Signal {
            id: 1,
            pair_symbol: "BTC/USDT".into(),
            direction: Direction::Long,
            level_price: 100.0,
            entry_price: 100.0,
            stop_loss: 99.6,
            timestamp: Utc::now(),
            trend_at_emission: crate::domain::TrendClassification::UpWeak,
            level_type: LevelType::Support,
            level_timeframe: Timeframe::H1,
            test_count: 0,
            status: SignalStatus::Active,
            exit_price: None,
            exit_timestamp: None,
            exit_reason: Option::<ExitReason>::None,
            max_favorable_move_pct: 0.0,
            max_adverse_move_pct: 0.0,
            threshold_touches: Default::default(),
            elder_screens_snapshot: Verdict::default(),
            result_fixed: None,
            result_fixed_at: None,
            archived: false,
        }
    }

    #[test]
    fn thresholds_and_mfe_mae_from_scenario_6() {
        // Spec §8 scenario 6: entry 100.00, closes 100.4, 100.7, 101.1,
        // 100.2, 100.6, 101.6, 99.5.
        let mut sig = base_signal();
        let t0 = sig.timestamp;
        let closes = [100.4, 100.7, 101.1, 100.2, 100.6, 101.6, 99.5];
        let bars: Vec<(DateTime<Utc>, f64)> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| (t0 + Duration::minutes(i as i64 + 1), c))
            .collect();

        let cfg = SignalConfig::default();
        recompute(&mut sig, &bars, &cfg);

        assert!(sig.threshold_touches.first_touch_0_5_pct.is_some());
        assert!(sig.threshold_touches.first_touch_1_0_pct.is_some());
        assert!(sig.threshold_touches.first_touch_1_5_pct.is_some());
        assert!((sig.max_favorable_move_pct - 0.016).abs() < 1e-6);
        assert!((sig.max_adverse_move_pct - (-0.005)).abs() < 1e-6);
    }

    #[test]
    fn short_losing_trade_pins_mfe_to_zero() {
        let mut sig = base_signal();
        sig.max_favorable_move_pct = 0.003;
        sig.exit_timestamp = Some(sig.timestamp + Duration::seconds(30));
        sig.exit_price = Some(99.0);
        let cfg = SignalConfig::default();
        pin_mfe_for_short_losing_trade(&mut sig, &cfg);
        assert_eq!(sig.max_favorable_move_pct, 0.0);
    }

    #[test]
    fn long_losing_trade_keeps_mfe() {
        let mut sig = base_signal();
        sig.max_favorable_move_pct = 0.003;
        sig.exit_timestamp = Some(sig.timestamp + Duration::minutes(5));
        sig.exit_price = Some(99.0);
        let cfg = SignalConfig::default();
        pin_mfe_for_short_losing_trade(&mut sig, &cfg);
        assert_eq!(sig.max_favorable_move_pct, 0.003);
    }
}
