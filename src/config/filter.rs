use std::collections::HashMap;

use super::Pct;
use crate::domain::Timeframe;

/// Tunables for the Elder-screens filter chain (spec §4.3, §6).
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Per-timeframe minimum level score required to pass the universal
    /// policy filter. Numeric defaults are deployment config per spec §9
    /// Open Questions; these are reasonable starting points.
    pub timeframe_min_score: HashMap<Timeframe, f64>,
    pub max_distance_pct: Pct,
    pub max_test_count: u32,
    pub block_sideways: bool,
    /// Score above which an off-trend direction is still admitted
    /// (the "level_score > 30" rule repeated across §4.3).
    pub off_trend_score_override: f64,
    /// ADX floor for SIDEWAYS admission in Screen 1.
    pub sideways_adx_floor: f64,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub rsi_warn_band: f64,
    /// Verdict cache freshness windows (§4.3).
    pub verdict_fresh_for_signal_secs: i64,
    pub verdict_fresh_for_display_secs: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let mut timeframe_min_score = HashMap::new();
        timeframe_min_score.insert(Timeframe::M15, 45.0);
        timeframe_min_score.insert(Timeframe::H1, 40.0);
        timeframe_min_score.insert(Timeframe::H4, 35.0);

        Self {
            timeframe_min_score,
            max_distance_pct: Pct::new(0.008),
            max_test_count: 3,
            block_sideways: false,
            off_trend_score_override: 30.0,
            sideways_adx_floor: 20.0,
            rsi_overbought: 75.0,
            rsi_oversold: 25.0,
            rsi_warn_band: 5.0,
            verdict_fresh_for_signal_secs: 60,
            verdict_fresh_for_display_secs: 300,
        }
    }
}

impl FilterConfig {
    pub fn min_score_for(&self, timeframe: Timeframe) -> f64 {
        self.timeframe_min_score.get(&timeframe).copied().unwrap_or(40.0)
    }
}
