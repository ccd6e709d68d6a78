use chrono::{DateTime, Utc};

use crate::domain::{Signal, SignalStatus};

/// Whether `candidate_price` on `pair_symbol` is blocked by an already-known
/// signal (spec §3 "A new signal MAY NOT be created..."). An ACTIVE signal
/// within `tolerance_pct` always blocks; a CLOSED one only blocks while
/// younger than `duplicate_window_hours` (spec §3 "A CLOSED signal older
/// than `signal_duplicate_window` no longer blocks").
pub fn blocks_emission(existing: &Signal, pair_symbol: &str, candidate_price: f64, tolerance_pct: f64, now: DateTime<Utc>, duplicate_window_hours: i64) -> bool {
    if !existing.is_duplicate_of(pair_symbol, candidate_price, tolerance_pct) {
        return false;
    }

    match existing.status {
        SignalStatus::Active => true,
        SignalStatus::Closed => (now - existing.timestamp).num_hours() < duplicate_window_hours,
    }
}

/// First blocking signal among `existing`, if any.
pub fn find_blocker<'a>(existing: &'a [Signal], pair_symbol: &str, candidate_price: f64, tolerance_pct: f64, now: DateTime<Utc>, duplicate_window_hours: i64) -> Option<&'a Signal> {
    existing.iter().find(|s| blocks_emission(s, pair_symbol, candidate_price, tolerance_pct, now, duplicate_window_hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason, FixedResult, LevelType, Timeframe, ThresholdTouches};
    use crate::filters::Verdict;
    use chrono::Duration;

    fn active_signal(price: f64) -> Signal {
        Signal {
            id: 1,
            pair_symbol: "BTC/USDT".into(),
            direction: Direction::Long,
            level_price: price,
            entry_price: price,
            stop_loss: price * 0.996,
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
            threshold_touches: ThresholdTouches::default(),
            elder_screens_snapshot: Verdict::default(),
            result_fixed: Option::<FixedResult>::None,
            result_fixed_at: None,
            archived: false,
        }
    }

    #[test]
    fn active_signal_within_tolerance_blocks() {
        let sig = active_signal(60_000.00);
        assert!(blocks_emission(&sig, "BTC/USDT", 60_003.00, 0.001, Utc::now(), 24));
    }

    #[test]
    fn old_closed_signal_no_longer_blocks() {
        let mut sig = active_signal(60_000.00);
        sig.status = SignalStatus::Closed;
        sig.timestamp = Utc::now() - Duration::hours(48);
        assert!(!blocks_emission(&sig, "BTC/USDT", 60_003.00, 0.001, Utc::now(), 24));
    }

    #[test]
    fn recent_closed_signal_still_blocks() {
        let mut sig = active_signal(60_000.00);
        sig.status = SignalStatus::Closed;
        sig.timestamp = Utc::now() - Duration::hours(1);
        assert!(blocks_emission(&sig, "BTC/USDT", 60_003.00, 0.001, Utc::now(), 24));
    }
}
