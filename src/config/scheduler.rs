use std::time::Duration;

/// Tunables for the scheduler (spec §4.5, §5, §6).
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub candle_tail_refresh_interval: Duration,
    pub gap_scan_interval: Duration,
    pub historical_ensure_interval: Duration,
    pub analysis_interval: Duration,
    pub level_cleanup_interval: Duration,
    pub outcome_update_interval: Duration,
    pub stale_signal_cleanup_interval: Duration,

    /// Bounded worker pool size for per-pair analyses / fetches (§5).
    pub worker_pool_size: usize,
    /// Upstream rate limit: max concurrent exchange fetches (§5).
    pub max_concurrent_fetches: usize,
    pub exchange_call_timeout: Duration,
    pub exchange_retry_attempts: u32,
    pub exchange_retry_base_backoff: Duration,
    /// How long the scheduler waits for in-flight jobs to drain on
    /// shutdown before cancelling them (§5 Cancellation).
    pub shutdown_drain: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            candle_tail_refresh_interval: Duration::from_secs(60),
            gap_scan_interval: Duration::from_secs(6 * 3600),
            historical_ensure_interval: Duration::from_secs(12 * 3600),
            analysis_interval: Duration::from_secs(60),
            level_cleanup_interval: Duration::from_secs(8 * 60),
            outcome_update_interval: Duration::from_secs(30),
            stale_signal_cleanup_interval: Duration::from_secs(24 * 3600),
            worker_pool_size: 8,
            max_concurrent_fetches: 8,
            exchange_call_timeout: Duration::from_secs(10),
            exchange_retry_attempts: 3,
            exchange_retry_base_backoff: Duration::from_millis(500),
            shutdown_drain: Duration::from_secs(15),
        }
    }
}
