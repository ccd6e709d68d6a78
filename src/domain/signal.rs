use chrono::{DateTime, Utc};
use strum_macros::Display;

use super::{Direction, LevelType, Timeframe, TrendClassification};
use crate::filters::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum SignalStatus {
    #[strum(to_string = "ACTIVE")]
    Active,
    #[strum(to_string = "CLOSED")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum ExitReason {
    #[strum(to_string = "favourable_threshold")]
    FavourableThreshold,
    #[strum(to_string = "adverse_threshold")]
    AdverseThreshold,
    #[strum(to_string = "retention_expired")]
    RetentionExpired,
    #[strum(to_string = "manual")]
    Manual,
}

/// Earliest times each favourable-excursion threshold was first reached
/// (§4.4 Outcome tracking).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct ThresholdTouches {
    pub first_touch_0_5_pct: Option<DateTime<Utc>>,
    pub first_touch_1_0_pct: Option<DateTime<Utc>>,
    pub first_touch_1_5_pct: Option<DateTime<Utc>>,
}

/// The single settlement rule used for analytics (§4.4 "result_fixed").
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FixedResult {
    FavourablePct(f64),
    AdversePct(f64),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Signal {
    pub id: i64,
    pub pair_symbol: String,
    pub direction: Direction,
    pub level_price: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub timestamp: DateTime<Utc>,
    pub trend_at_emission: TrendClassification,
    pub level_type: LevelType,
    pub level_timeframe: Timeframe,
    pub test_count: u32,
    pub status: SignalStatus,

    pub exit_price: Option<f64>,
    pub exit_timestamp: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,

    pub max_favorable_move_pct: f64,
    pub max_adverse_move_pct: f64,
    pub threshold_touches: ThresholdTouches,

    pub elder_screens_snapshot: Verdict,
    pub result_fixed: Option<FixedResult>,
    pub result_fixed_at: Option<DateTime<Utc>>,

    pub archived: bool,
}

impl Signal {
    /// Stop distance is a fixed fraction of entry (default 0.4%, §3).
    pub fn stop_loss_for(direction: Direction, entry_price: f64, stop_loss_pct: f64) -> f64 {
        match direction {
            Direction::Long => entry_price * (1.0 - stop_loss_pct),
            Direction::Short => entry_price * (1.0 + stop_loss_pct),
        }
    }

    pub fn favourable_move_pct(&self, close: f64) -> f64 {
        let raw = (close - self.entry_price) / self.entry_price;
        match self.direction {
            Direction::Long => raw,
            Direction::Short => -raw,
        }
    }

    pub fn is_stop_side_valid(&self) -> bool {
        match self.direction {
            Direction::Long => self.stop_loss < self.entry_price,
            Direction::Short => self.stop_loss > self.entry_price,
        }
    }

    /// Duplicate-suppression key: same pair, price within 0.1% (§3).
    pub fn is_duplicate_of(&self, pair_symbol: &str, price: f64, tolerance_pct: f64) -> bool {
        if self.pair_symbol != pair_symbol || self.entry_price <= 0.0 {
            return false;
        }
        (self.entry_price - price).abs() / self.entry_price < tolerance_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_loss_is_below_entry_for_long_and_above_for_short() {
        let long_stop = Signal::stop_loss_for(Direction::Long, 100.0, 0.004);
        let short_stop = Signal::stop_loss_for(Direction::Short, 100.0, 0.004);
        assert!((long_stop - 99.6).abs() < 1e-9);
        assert!((short_stop - 100.4).abs() < 1e-9);
    }

    #[test]
    fn favourable_move_flips_sign_for_short() {
        let mut sig = make_signal(Direction::Short, 100.0);
        assert!((sig.favourable_move_pct(99.0) - 0.01).abs() < 1e-9);
        sig.direction = Direction::Long;
        assert!((sig.favourable_move_pct(99.0) - (-0.01)).abs() < 1e-9);
    }

    fn make_signal(direction: Direction, entry: f64) -> Signal {
        Signal {
            id: 1,
            pair_symbol: "BTC/USDT".into(),
            direction,
            level_price: entry,
            entry_price: entry,
            stop_loss: Signal::stop_loss_for(direction, entry, 0.004),
            timestamp: Utc::now(),
            trend_at_emission: TrendClassification::Unknown,
            level_type: LevelType::Support,
            level_timeframe: Timeframe::H1,
            test_count: 0,
            status: SignalStatus::Active,
            exit_price: None,
            exit_timestamp: None,
            exit_reason: None,
            max_favorable_move_pct: 0.0,
            max_adverse_move_pct: 0.0,
            threshold_touches: ThresholdTouches::default(),
            elder_screens_snapshot: Verdict::default(),
            result_fixed: None,
            result_fixed_at: None,
            archived: false,
        }
    }
}
