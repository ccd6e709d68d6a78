//! C5 — the Scheduler (spec §4.5, §5): owns the pair universe and drives
//! every periodic job (per-pair analysis, candle maintenance, outcome
//! updates, stale-signal cleanup) from a bounded worker pool, generalizing
//! the teacher's `spawn_worker_thread` job-queue pattern
//! (`leemthai-sniper/src/engine/worker.rs`) from an OS-thread + mpsc queue
//! to `tokio::spawn` tasks woken by `tokio::time::interval`.

mod analysis;
mod maintenance;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{FilterConfig, LevelConfig, SchedulerConfig, SignalConfig};
use crate::domain::Pair;
use crate::filters::VerdictCache;
use crate::levels::LevelEngine;
use crate::storage::Storage;
use crate::store::OhlcvStore;

/// Owns the configured universe and runs every periodic job from spec
/// §4.5's table. Re-entrance of a given pair's analysis is prevented by a
/// per-pair try-lock; upstream fetch concurrency is bounded by a
/// semaphore sized from `SchedulerConfig::max_concurrent_fetches`.
pub struct Scheduler {
    storage: Arc<dyn Storage>,
    store: Arc<OhlcvStore>,
    level_engine: Arc<LevelEngine>,
    verdict_cache: VerdictCache,
    pairs: Vec<Pair>,
    level_cfg: LevelConfig,
    filter_cfg: FilterConfig,
    signal_cfg: SignalConfig,
    scheduler_cfg: SchedulerConfig,
    fetch_semaphore: Arc<Semaphore>,
    analysis_guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: Arc<dyn Storage>,
        store: Arc<OhlcvStore>,
        level_engine: Arc<LevelEngine>,
        pairs: Vec<Pair>,
        level_cfg: LevelConfig,
        filter_cfg: FilterConfig,
        signal_cfg: SignalConfig,
        scheduler_cfg: SchedulerConfig,
    ) -> Arc<Self> {
        let fetch_semaphore = Arc::new(Semaphore::new(scheduler_cfg.max_concurrent_fetches.max(1)));
        Arc::new(Self {
            storage,
            store,
            level_engine,
            verdict_cache: VerdictCache::new(),
            pairs,
            level_cfg,
            filter_cfg,
            signal_cfg,
            scheduler_cfg,
            fetch_semaphore,
            analysis_guards: Mutex::new(HashMap::new()),
        })
    }

    async fn guard_for(&self, symbol: &str) -> Arc<Mutex<()>> {
        let mut guards = self.analysis_guards.lock().await;
        guards.entry(symbol.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Spawns every periodic job and blocks until all of them have
    /// stopped, which happens once `shutdown` is cancelled (spec §5
    /// "Cancellation"). Each job gets up to `shutdown_drain` to finish its
    /// in-flight work before this returns.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let drain = self.scheduler_cfg.shutdown_drain;
        let jobs: Vec<JoinHandle<()>> = vec![
            self.clone().spawn_loop(self.scheduler_cfg.analysis_interval, shutdown.clone(), "analysis", analysis::run_analysis_cycle),
            self.clone().spawn_loop(
                self.scheduler_cfg.candle_tail_refresh_interval,
                shutdown.clone(),
                "candle_tail_refresh",
                maintenance::run_tail_refresh_cycle,
            ),
            self.clone().spawn_loop(self.scheduler_cfg.gap_scan_interval, shutdown.clone(), "gap_scan", maintenance::run_gap_scan_cycle),
            self.clone().spawn_loop(
                self.scheduler_cfg.historical_ensure_interval,
                shutdown.clone(),
                "historical_ensure",
                maintenance::run_historical_ensure_cycle,
            ),
            self.clone().spawn_loop(
                self.scheduler_cfg.level_cleanup_interval,
                shutdown.clone(),
                "level_cleanup",
                maintenance::run_level_cleanup_cycle,
            ),
            self.clone().spawn_loop(
                self.scheduler_cfg.outcome_update_interval,
                shutdown.clone(),
                "outcome_update",
                maintenance::run_outcome_update_cycle,
            ),
            self.clone().spawn_loop(
                self.scheduler_cfg.stale_signal_cleanup_interval,
                shutdown.clone(),
                "stale_signal_cleanup",
                maintenance::run_stale_signal_cleanup_cycle,
            ),
        ];

        info!(job_count = jobs.len(), "scheduler started all periodic jobs");

        for job in jobs {
            if time::timeout(drain, job).await.is_err() {
                warn!("a periodic job did not drain within the shutdown window");
            }
        }
        info!("scheduler stopped");
    }

    fn spawn_loop<F, Fut>(self: Arc<Self>, period: Duration, shutdown: CancellationToken, name: &'static str, job: F) -> JoinHandle<()>
    where
        F: Fn(Arc<Self>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send,
    {
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = job(self.clone()).await {
                            warn!(job = name, error = %err, "periodic job failed");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        debug!(job = name, "stopping on shutdown signal");
                        break;
                    }
                }
            }
        })
    }
}
