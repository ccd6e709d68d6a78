use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::Timeframe;
use crate::levels::eviction_reason;
use crate::signals::Lifecycle;

use super::Scheduler;

const CORE_TIMEFRAMES: [Timeframe; 3] = [Timeframe::M15, Timeframe::H1, Timeframe::H4];
const TAIL_REFRESH_LIMIT: usize = 5;
const GAP_SCAN_LIMIT: usize = 300;
const HISTORICAL_ENSURE_DAYS: i64 = 7;

/// Candle tail refresh (spec §4.5): `OhlcvStore::get_candles` already
/// refreshes the open bucket as a side effect of any read, so this job is
/// a thin, frequent poke to keep the tail from ever going stale between
/// analysis cycles.
pub(crate) async fn run_tail_refresh_cycle(scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    for pair in scheduler.pairs.iter().filter(|p| p.enabled) {
        for timeframe in CORE_TIMEFRAMES {
            scheduler.store.get_candles(&pair.symbol, timeframe, TAIL_REFRESH_LIMIT).await;
        }
    }
    Ok(())
}

/// Gap detection & fill (spec §4.5): a wider, less frequent read so the
/// store's interior-gap scan has enough history to notice holes left by
/// an earlier outage and fill them.
pub(crate) async fn run_gap_scan_cycle(scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    for pair in scheduler.pairs.iter().filter(|p| p.enabled) {
        for timeframe in CORE_TIMEFRAMES {
            scheduler.store.get_candles(&pair.symbol, timeframe, GAP_SCAN_LIMIT).await;
        }
    }
    Ok(())
}

/// Historical ensure (spec §4.5): guarantees at least a week of coverage
/// per pair/timeframe.
pub(crate) async fn run_historical_ensure_cycle(scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    for pair in scheduler.pairs.iter().filter(|p| p.enabled) {
        for timeframe in CORE_TIMEFRAMES {
            if let Err(err) = scheduler.store.ensure_history(&pair.symbol, timeframe, HISTORICAL_ENSURE_DAYS).await {
                warn!(pair = %pair.symbol, %timeframe, error = %err, "historical ensure failed");
            }
        }
    }
    Ok(())
}

/// Level cleanup sweep (spec §4.5): evicts broken/stale/over-tested/
/// too-far levels independently of the analysis cycle, so a level doesn't
/// linger an extra tick when its pair's analysis guard was busy.
pub(crate) async fn run_level_cleanup_cycle(scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    let now = Utc::now();
    for pair in scheduler.pairs.iter().filter(|p| p.enabled) {
        for timeframe in CORE_TIMEFRAMES {
            let candles = scheduler.store.get_candles(&pair.symbol, timeframe, GAP_SCAN_LIMIT).await;
            let Some(current_price) = candles.last().map(|c| c.close) else {
                continue;
            };

            let levels = scheduler.storage.load_levels(&pair.symbol, timeframe).await?;
            for level in levels {
                if let Some(reason) = eviction_reason(&level, current_price, &candles, &scheduler.level_cfg, now) {
                    debug!(pair = %pair.symbol, level_id = level.id, %reason, "level cleanup evicting level");
                    scheduler.storage.delete_level(&level.id.to_string()).await?;
                }
            }
        }
    }
    Ok(())
}

/// Outcome updater (spec §4.4, §4.5): rescans 1m closes spanning each
/// ACTIVE signal's life and recomputes MFE/MAE/threshold touches/
/// `result_fixed`.
pub(crate) async fn run_outcome_update_cycle(scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    let now = Utc::now();
    let lifecycle = Lifecycle::new(scheduler.storage.as_ref(), &scheduler.signal_cfg);
    let mut signals = scheduler.storage.load_open_signals().await?;

    for signal in signals.iter_mut() {
        let one_minute = scheduler
            .store
            .get_candles_since(&signal.pair_symbol, Timeframe::M1, signal.timestamp.timestamp_millis())
            .await;
        if one_minute.is_empty() {
            continue;
        }
        let bars: Vec<(DateTime<Utc>, f64)> = one_minute
            .iter()
            .map(|c| (DateTime::<Utc>::from_timestamp_millis(c.bucket_start_ms).unwrap_or(now), c.close))
            .collect();

        if let Err(err) = lifecycle.update_outcome(signal, &bars, now).await {
            warn!(signal_id = signal.id, error = %err, "outcome update failed");
        }
    }
    Ok(())
}

/// Stale-signal cleanup (spec §4.5): archives ACTIVE signals past the
/// retention window, closing them first. Signals already CLOSED outside
/// the retention window but never archived are not revisited here — the
/// store only exposes ACTIVE rows for this sweep (see DESIGN.md).
pub(crate) async fn run_stale_signal_cleanup_cycle(scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    let now = Utc::now();
    let lifecycle = Lifecycle::new(scheduler.storage.as_ref(), &scheduler.signal_cfg);
    let mut signals = scheduler.storage.load_open_signals().await?;
    let archived = lifecycle.archive_stale(&mut signals, now).await?;
    if archived > 0 {
        debug!(archived, "stale-signal cleanup archived signals");
    }
    Ok(())
}
