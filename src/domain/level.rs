use chrono::{DateTime, Utc};
use strum_macros::Display;

use super::Timeframe;
use crate::filters::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum LevelType {
    #[strum(to_string = "support")]
    Support,
    #[strum(to_string = "resistance")]
    Resistance,
}

impl LevelType {
    /// Support ⇒ LONG, resistance ⇒ SHORT (§4.4 Admission).
    pub fn direction(self) -> super::Direction {
        match self {
            LevelType::Support => super::Direction::Long,
            LevelType::Resistance => super::Direction::Short,
        }
    }
}

/// Score contributions kept alongside the composed total so that the base
/// score and the triangle bonus remain individually inspectable (§4.2).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct ScoreBreakdown {
    pub distance_score: f64,
    pub volume_score: f64,
    pub touch_score: f64,
    pub freshness_score: f64,
    pub approach_score: f64,
    pub trend_bonus: f64,
    pub base_score: f64,
    pub triangle_bonus: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.base_score + self.triangle_bonus
    }
}

/// A cached Elder-screens verdict plus the timestamp it was computed at,
/// so freshness can be judged against the 60s/5min windows of §4.3.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CachedVerdict {
    pub verdict: Verdict,
    pub computed_at: DateTime<Utc>,
}

/// A horizontal support/resistance level on one (symbol, timeframe).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Level {
    pub id: i64,
    pub pair_symbol: String,
    pub price: f64,
    pub level_type: LevelType,
    pub timeframe: Timeframe,

    /// Computed once at discovery time; never changes afterwards.
    pub historical_touches: u32,
    /// Increments on every qualifying live observation.
    pub live_test_count: u32,

    pub score: ScoreBreakdown,

    /// Wall-clock time the row was inserted — drives `age`. Distinct from
    /// `first_touch`, the time of the originating fractal bar (§9).
    pub created_at: DateTime<Utc>,
    pub first_touch: DateTime<Utc>,
    pub last_touch: DateTime<Utc>,

    pub is_active: bool,

    pub last_verdict: Option<CachedVerdict>,
    /// Set once a touch/approach has produced a signal on this level, so
    /// the level keeps living for a possible later bounce (§4.4 Dedup).
    pub signal_generated: bool,
}

impl Level {
    /// Two levels on the same pair/type are "the same level" when their
    /// prices differ by less than 0.5% (§3 Level invariants).
    pub fn same_level(a_price: f64, b_price: f64) -> bool {
        if a_price <= 0.0 || b_price <= 0.0 {
            return false;
        }
        ((a_price - b_price).abs() / a_price) < 0.005
    }

    pub fn distance_pct(&self, current_price: f64) -> f64 {
        if self.price <= 0.0 {
            return f64::INFINITY;
        }
        (current_price - self.price).abs() / self.price
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_level_merges_within_half_percent() {
        assert!(Level::same_level(100.0, 100.4));
        assert!(!Level::same_level(100.0, 100.6));
    }

    #[test]
    fn score_breakdown_totals_base_plus_triangle() {
        let s = ScoreBreakdown {
            base_score: 62.0,
            triangle_bonus: 10.0,
            ..Default::default()
        };
        assert_eq!(s.total(), 72.0);
    }
}
