use super::Pct;

/// Tunables for the level engine (spec §6). Defaults mirror spec §2/§4.2.
#[derive(Debug, Clone)]
pub struct LevelConfig {
    /// Cooling-off window for fractal anchoring, in minutes.
    pub exclude_recent_minutes: i64,
    /// Window half-width for swing detection.
    pub fractal_lookback: usize,
    /// Fallback lookback used when no fractals are found at the primary one.
    pub fractal_lookback_fallback: usize,
    pub historical_touch_tolerance: Pct,
    pub live_touch_tolerance: Pct,
    pub break_tolerance: Pct,
    pub min_historical_touches: u32,
    pub max_historical_touches: u32,
    pub max_live_tests: u32,
    pub min_distance_pct: Pct,
    pub max_distance_pct: Pct,
    pub max_age_days: i64,
    /// Minimum gap between two live-touch observations to count as
    /// distinct tests (§4.2 Touch counting).
    pub live_touch_min_interval_minutes: i64,
    /// Max candidate levels kept per timeframe per scan (§4.2 Role).
    pub max_levels_per_timeframe: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            exclude_recent_minutes: 60,
            fractal_lookback: 5,
            fractal_lookback_fallback: 1,
            historical_touch_tolerance: Pct::new(0.003),
            live_touch_tolerance: Pct::new(0.004),
            break_tolerance: Pct::new(0.005),
            min_historical_touches: 2,
            max_historical_touches: 8,
            max_live_tests: 5,
            min_distance_pct: Pct::new(0.0),
            max_distance_pct: Pct::new(0.05),
            max_age_days: 14,
            live_touch_min_interval_minutes: 5,
            max_levels_per_timeframe: 5,
        }
    }
}
