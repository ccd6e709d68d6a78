use super::Pct;

/// Tunables for the signal lifecycle (spec §4.4, §6).
#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub stop_loss_pct: Pct,
    pub duplicate_price_tolerance: Pct,
    pub ready_distance_pct: Pct,
    pub touch_distance_pct: Pct,
    /// A CLOSED signal older than this no longer blocks dedup (§3).
    pub duplicate_window_hours: i64,
    /// Favourable/adverse thresholds that fix the outcome (§4.4
    /// "result_fixed").
    pub fixed_favourable_pct: Pct,
    pub fixed_adverse_pct: Pct,
    /// Thresholds tracked as `first_touch_*_pct_ts` (§3, §4.4).
    pub mfe_thresholds_pct: [Pct; 3],
    /// Below this trade duration, a losing trade's MFE is pinned to 0
    /// (§4.4 Outcome tracking).
    pub short_trade_floor_secs: i64,
    /// Stale-signal retention window (§4.5).
    pub retention_days: i64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: Pct::new(0.004),
            duplicate_price_tolerance: Pct::new(0.001),
            ready_distance_pct: Pct::new(0.007),
            touch_distance_pct: Pct::new(0.005),
            duplicate_window_hours: 24,
            fixed_favourable_pct: Pct::new(0.015),
            fixed_adverse_pct: Pct::new(0.005),
            mfe_thresholds_pct: [Pct::new(0.005), Pct::new(0.01), Pct::new(0.015)],
            short_trade_floor_secs: 60,
            retention_days: 90,
        }
    }
}
