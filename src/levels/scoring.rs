use crate::domain::{Candle, LevelType, ScoreBreakdown, TrendClassification};

use super::fractal::Fractal;
use super::triangle::{triangle_bonus, ActiveTriangle};

/// Inputs to [`score_level`], gathered by the caller from the candle
/// window, the fractal that anchors the level, and its trend context
/// (spec §4.2 "Quality score").
pub struct ScoringInput<'a> {
    pub level_type: LevelType,
    pub level_price: f64,
    pub current_price: f64,
    pub fractal: Fractal,
    /// Candles up to and including the fractal bar, used for the approach
    /// score's short look-back window.
    pub candles_up_to_fractal: &'a [Candle],
    pub avg_volume: f64,
    pub historical_touches: u32,
    pub min_historical_touches: u32,
    pub max_historical_touches: u32,
    pub age_minutes: f64,
    pub max_age_minutes: f64,
    pub trend: TrendClassification,
    pub triangle: Option<ActiveTriangle>,
}

/// Weighted composition of six terms into a base score, plus the
/// independently-tracked triangle bonus (spec §4.2 table).
pub fn score_level(input: &ScoringInput) -> ScoreBreakdown {
    let distance_score = distance_score(input.level_price, input.current_price);
    let volume_score = volume_score(input.fractal.volume, input.avg_volume);
    let touch_score = touch_score(input.historical_touches, input.min_historical_touches, input.max_historical_touches);
    let freshness_score = freshness_score(input.age_minutes, input.max_age_minutes);
    let approach_score = approach_score(input.candles_up_to_fractal, input.level_type, input.level_price);
    let trend_bonus = trend_bonus(input.level_type, input.trend);

    let base_score = distance_score * 0.25
        + volume_score * 0.15
        + touch_score * 0.20
        + freshness_score * 0.15
        + approach_score * 0.15
        + trend_bonus * 0.10;

    let bonus = triangle_bonus(input.level_price, input.level_type, input.triangle.as_ref());

    ScoreBreakdown {
        distance_score,
        volume_score,
        touch_score,
        freshness_score,
        approach_score,
        trend_bonus,
        base_score,
        triangle_bonus: bonus,
    }
}

/// Decays linearly with % distance from current price; 0% away is 100,
/// `>= 5%` away is 0 (spec §4.2 "distance_score").
fn distance_score(level_price: f64, current_price: f64) -> f64 {
    if level_price <= 0.0 {
        return 0.0;
    }
    let distance_pct = (current_price - level_price).abs() / level_price;
    (100.0 * (1.0 - distance_pct / 0.05)).clamp(0.0, 100.0)
}

/// Volume of the originating fractal bar relative to the window average,
/// capped (spec §4.2 "volume_score").
fn volume_score(fractal_volume: f64, avg_volume: f64) -> f64 {
    if avg_volume <= 0.0 {
        return 0.0;
    }
    (100.0 * fractal_volume / (avg_volume * 2.0)).clamp(0.0, 100.0)
}

/// Bounded [min, max] historical touches mapped onto [0, 100] (spec §4.2
/// "touch_score").
fn touch_score(historical_touches: u32, min: u32, max: u32) -> f64 {
    if max <= min {
        return 100.0;
    }
    let t = historical_touches.clamp(min, max) as f64;
    (100.0 * (t - min as f64) / (max - min) as f64).clamp(0.0, 100.0)
}

/// Decays linearly with the age of the originating bar; fresh ⇒ 100,
/// `age >= max_age` ⇒ 0 (spec §4.2 "freshness_score").
fn freshness_score(age_minutes: f64, max_age_minutes: f64) -> f64 {
    if max_age_minutes <= 0.0 {
        return 0.0;
    }
    (100.0 * (1.0 - age_minutes / max_age_minutes)).clamp(0.0, 100.0)
}

/// Direction and magnitude of price movement into the level over the bars
/// leading up to the fractal; zero unless price approached from the
/// correct side (downward into support, upward into resistance), grounded
/// on `original_source/core/analysis_engine.py`'s `_calculate_approach_score`
/// (spec §4.2 "approach_score").
fn approach_score(candles_up_to_fractal: &[Candle], level_type: LevelType, level_price: f64) -> f64 {
    const WINDOW: usize = 5;
    if candles_up_to_fractal.len() < 2 || level_price <= 0.0 {
        return 0.0;
    }
    let start = candles_up_to_fractal.len().saturating_sub(WINDOW + 1);
    let segment = &candles_up_to_fractal[start..];
    if segment.len() < 2 {
        return 0.0;
    }

    let start_price = segment.first().unwrap().close;
    let end_price = segment.last().unwrap().close;
    let price_change = end_price - start_price;

    match level_type {
        LevelType::Support if price_change >= 0.0 => return 0.0,
        LevelType::Resistance if price_change <= 0.0 => return 0.0,
        _ => {}
    }

    let normalized = (price_change.abs() / level_price) * 100.0;
    (normalized * 4.0).min(100.0)
}

/// Bonus for alignment of level type with trend context; support in an
/// uptrend (or resistance in a downtrend) earns the most, grounded on
/// `_trend_bonus` (spec §4.2 "trend_bonus").
fn trend_bonus(level_type: LevelType, trend: TrendClassification) -> f64 {
    let up = trend.is_up();
    let down = trend.is_down();
    let sideways = trend == TrendClassification::Sideways;

    match level_type {
        LevelType::Support if up => 100.0,
        LevelType::Support if sideways => 60.0,
        LevelType::Support if down => 20.0,
        LevelType::Resistance if down => 100.0,
        LevelType::Resistance if sideways => 60.0,
        LevelType::Resistance if up => 20.0,
        _ => 40.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_score_is_full_at_zero_distance_and_zero_beyond_5pct() {
        assert_eq!(distance_score(100.0, 100.0), 100.0);
        assert_eq!(distance_score(100.0, 106.0), 0.0);
    }

    #[test]
    fn touch_score_clamps_to_configured_bounds() {
        assert_eq!(touch_score(2, 2, 8), 0.0);
        assert_eq!(touch_score(8, 2, 8), 100.0);
        assert_eq!(touch_score(1, 2, 8), 0.0);
    }

    #[test]
    fn approach_score_zero_when_price_moves_away_from_support() {
        let candles = vec![
            Candle::new(0, 100.0, 101.0, 99.0, 99.0, 1.0),
            Candle::new(1, 100.5, 101.0, 99.0, 100.5, 1.0),
        ];
        assert_eq!(approach_score(&candles, LevelType::Support, 100.0), 0.0);
    }

    #[test]
    fn trend_bonus_favours_support_in_uptrend() {
        assert_eq!(trend_bonus(LevelType::Support, TrendClassification::UpStrong), 100.0);
        assert_eq!(trend_bonus(LevelType::Support, TrendClassification::DownStrong), 20.0);
    }
}
