use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::LevelConfig;
use crate::domain::{Candle, Level, LevelType, Timeframe, TrendClassification};

use super::fractal::{candles_for_discovery, find_fractals, Fractal};
use super::scoring::{score_level, ScoringInput};
use super::touches::count_historical_touches;
use super::triangle::TrianglePatternProvider;

/// C2 — the Level Engine (spec §4.2): turns a candle window into a small
/// set of scored, deduplicated support/resistance levels.
pub struct LevelEngine {
    config: LevelConfig,
    triangle_provider: Arc<dyn TrianglePatternProvider>,
}

impl LevelEngine {
    pub fn new(config: LevelConfig, triangle_provider: Arc<dyn TrianglePatternProvider>) -> Self {
        Self { config, triangle_provider }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Discover up to `max_levels_per_timeframe` support and the same
    /// number of resistance candidates from `candles` (spec §4.2
    /// "Fractal discovery", "Quality score"). Candidates are fresh
    /// [`Level`]s with `id == 0`; merging against previously-known levels
    /// happens separately in [`merge_levels`].
    pub fn discover(&self, pair_symbol: &str, timeframe: Timeframe, candles: &[Candle], trend: TrendClassification, now: DateTime<Utc>) -> Vec<Level> {
        let trimmed = candles_for_discovery(candles, self.config.exclude_recent_minutes);
        if trimmed.len() < self.config.fractal_lookback * 2 + 1 {
            return Vec::new();
        }

        let (lows, highs) = find_fractals(trimmed, self.config.fractal_lookback, self.config.fractal_lookback_fallback);
        let avg_volume = mean_volume(trimmed);
        let Some(latest) = trimmed.last() else { return Vec::new() };
        let current_price = latest.close;

        let mut supports = self.build_candidates(pair_symbol, timeframe, LevelType::Support, &lows, trimmed, avg_volume, current_price, trend, now);
        let mut resistances = self.build_candidates(pair_symbol, timeframe, LevelType::Resistance, &highs, trimmed, avg_volume, current_price, trend, now);

        supports.sort_by(|a, b| b.score.total().partial_cmp(&a.score.total()).unwrap_or(std::cmp::Ordering::Equal));
        resistances.sort_by(|a, b| b.score.total().partial_cmp(&a.score.total()).unwrap_or(std::cmp::Ordering::Equal));
        supports.truncate(self.config.max_levels_per_timeframe);
        resistances.truncate(self.config.max_levels_per_timeframe);

        supports.into_iter().chain(resistances).collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn build_candidates(
        &self,
        pair_symbol: &str,
        timeframe: Timeframe,
        level_type: LevelType,
        fractals: &[Fractal],
        trimmed: &[Candle],
        avg_volume: f64,
        current_price: f64,
        trend: TrendClassification,
        now: DateTime<Utc>,
    ) -> Vec<Level> {
        fractals
            .iter()
            .filter_map(|fractal| {
                let historical_touches = count_historical_touches(trimmed, fractal.price, *self.config.historical_touch_tolerance);
                if historical_touches < self.config.min_historical_touches || historical_touches > self.config.max_historical_touches {
                    return None;
                }

                let distance_pct = (current_price - fractal.price).abs() / fractal.price.max(1e-9);
                if distance_pct < *self.config.min_distance_pct || distance_pct > *self.config.max_distance_pct {
                    return None;
                }

                let last_ts_ms = trimmed.last().map(|c| c.bucket_start_ms).unwrap_or(fractal.bucket_start_ms);
                let age_minutes = (last_ts_ms - fractal.bucket_start_ms) as f64 / 60_000.0;
                let fractal_time = DateTime::<Utc>::from_timestamp_millis(fractal.bucket_start_ms).unwrap_or(now);

                let triangle = self.triangle_provider.active_triangle(pair_symbol, timeframe, fractal.price);
                let score = score_level(&ScoringInput {
                    level_type,
                    level_price: fractal.price,
                    current_price,
                    fractal: *fractal,
                    candles_up_to_fractal: &trimmed[..=fractal.index],
                    avg_volume,
                    historical_touches,
                    min_historical_touches: self.config.min_historical_touches,
                    max_historical_touches: self.config.max_historical_touches,
                    age_minutes,
                    max_age_minutes: (self.config.max_age_days * 24 * 60) as f64,
                    trend,
                    triangle,
                });

                Some(Level {
                    id: 0,
                    pair_symbol: pair_symbol.to_string(),
                    price: fractal.price,
                    level_type,
                    timeframe,
                    historical_touches,
                    live_test_count: 0,
                    score,
                    created_at: now,
                    first_touch: fractal_time,
                    last_touch: fractal_time,
                    is_active: true,
                    last_verdict: None,
                    signal_generated: false,
                })
            })
            .collect()
    }
}

fn mean_volume(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64
}

/// Merge freshly discovered `candidates` into `existing` levels: a
/// candidate within 0.5% of an existing level of the same pair/type
/// updates that row's counters in place rather than creating a duplicate
/// (spec §3 "Two levels ... are considered the same level and merged").
/// Returns the updated set; callers persist it via [`crate::storage::Storage`].
pub fn merge_levels(existing: Vec<Level>, candidates: Vec<Level>) -> Vec<Level> {
    let mut merged = existing;

    'candidate: for candidate in candidates {
        for level in merged.iter_mut() {
            if level.pair_symbol == candidate.pair_symbol
                && level.level_type == candidate.level_type
                && level.timeframe == candidate.timeframe
                && Level::same_level(level.price, candidate.price)
            {
                level.score = candidate.score;
                level.historical_touches = level.historical_touches.max(candidate.historical_touches);
                level.last_touch = candidate.last_touch.max(level.last_touch);
                continue 'candidate;
            }
        }
        merged.push(candidate);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::triangle::NoopTriangleProvider;

    fn flat_series_with_dip(n: usize, step_ms: i64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let dip = if i == n / 2 { -3.0 } else { 0.0 };
                let base = 100.0 + dip;
                Candle::new(i as i64 * step_ms, base, base + 1.0, base - 1.0, base, 100.0)
            })
            .collect()
    }

    #[test]
    fn cooling_off_excludes_a_fractal_anchored_two_bars_from_the_end() {
        // Scenario 1 (spec §8): 200 15m candles, swing low at index 198
        // (excluded by the 60-minute/4-bar cooling-off window) and another,
        // distinct, swing low at index 100 (kept).
        let step = Timeframe::M15.duration_ms();
        let mut candles: Vec<Candle> = (0..200).map(|i| Candle::new(i * step, 100.0, 100.5, 99.5, 100.0, 10.0)).collect();
        candles[100] = Candle::new(100 * step, 100.0, 100.2, 95.0, 98.0, 50.0);
        candles[198] = Candle::new(198 * step, 100.0, 100.2, 90.0, 93.0, 50.0);

        let engine = LevelEngine::new(LevelConfig::default(), Arc::new(NoopTriangleProvider));
        let discovered = engine.discover("BTC/USDT", Timeframe::M15, &candles, TrendClassification::Sideways, Utc::now());

        assert!(discovered.iter().any(|l| (l.price - 95.0).abs() < 1e-6), "fractal at index 100 should be discovered");
        assert!(
            discovered.iter().all(|l| (l.price - 90.0).abs() > 1e-6),
            "fractal at index 198 is inside the cooling-off window and must never be proposed"
        );
    }

    #[test]
    fn merge_updates_existing_level_instead_of_duplicating() {
        let now = Utc::now();
        let existing = Level {
            id: 7,
            pair_symbol: "BTC/USDT".into(),
            price: 100.0,
            level_type: LevelType::Support,
            timeframe: Timeframe::H1,
            historical_touches: 2,
            live_test_count: 1,
            score: Default::default(),
            created_at: now,
            first_touch: now,
            last_touch: now,
            is_active: true,
            last_verdict: None,
            signal_generated: false,
        };
        let mut candidate = existing.clone();
        candidate.id = 0;
        candidate.price = 100.3; // within 0.5%
        candidate.historical_touches = 5;

        let merged = merge_levels(vec![existing], vec![candidate]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, 7);
        assert_eq!(merged[0].historical_touches, 5);
    }

    #[test]
    fn smoke_builds_candidates_without_panicking() {
        let engine = LevelEngine::new(LevelConfig::default(), Arc::new(NoopTriangleProvider));
        let candles = flat_series_with_dip(200, Timeframe::M15.duration_ms());
        let _ = engine.discover("ETH/USDT", Timeframe::M15, &candles, TrendClassification::UpWeak, Utc::now());
    }
}
