use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::MARKET_REFERENCE_SYMBOL;
use crate::domain::{CachedVerdict, Candle, Pair, Timeframe, TrendClassification, classify_trend};
use crate::filters::{Verdict, VerdictCache, evaluate_policy, evaluate_screen1, evaluate_screen2};
use crate::indicators::{adx, ema_series, macd_series, rsi};
use crate::levels::{eviction_reason, is_new_live_test, merge_levels};
use crate::signals::{Lifecycle, direction_for};

use super::Scheduler;

const DISCOVERY_WINDOW: usize = 300;
const MIN_OSCILLATOR_HISTORY: usize = 60;
const CORE_TIMEFRAMES: [Timeframe; 3] = [Timeframe::M15, Timeframe::H1, Timeframe::H4];

/// Per-pair analysis (spec §4.5 "Per-pair analysis"): discover/merge/evict
/// levels on each core timeframe, re-check the Elder screens on whatever
/// survives, and run admission/dedup/emission through the signal
/// lifecycle. Driven by [`super::Scheduler::run`] once per pair per tick,
/// guarded against re-entrance by a per-pair try-lock.
pub(crate) async fn run_analysis_cycle(scheduler: Arc<Scheduler>) -> anyhow::Result<()> {
    let now = Utc::now();
    let (btc_trend, btc_adx, btc_ema_ordering) = match scheduler.pairs.iter().find(|p| p.symbol == MARKET_REFERENCE_SYMBOL) {
        Some(btc) => market_trend(&scheduler, &btc.symbol).await,
        None => (TrendClassification::Unknown, None, None),
    };

    let mut handles = Vec::new();
    for pair in scheduler.pairs.iter().filter(|p| p.enabled).cloned().collect::<Vec<_>>() {
        let scheduler = scheduler.clone();
        handles.push(tokio::spawn(async move {
            let guard = scheduler.guard_for(&pair.symbol).await;
            let Ok(_lock) = guard.try_lock() else {
                debug!(pair = %pair.symbol, "analysis already in flight, skipping tick");
                return;
            };

            let Ok(_permit) = scheduler.fetch_semaphore.clone().acquire_owned().await else {
                return;
            };

            match analyze_pair(&scheduler, &pair, btc_trend, btc_adx, btc_ema_ordering, now).await {
                Ok(emitted) if emitted > 0 => info!(pair = %pair.symbol, emitted, "analysis cycle emitted signals"),
                Ok(_) => {}
                Err(err) => warn!(pair = %pair.symbol, error = %err, "pair analysis failed"),
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

/// EMA20/EMA50/ADX(14) trend classification for `symbol` on its 4h series,
/// plus the raw EMA20-vs-EMA50 ordering Screen 1's SIDEWAYS branch needs
/// (spec §4.3 "screen1_4h_trend" names both the BTC-market and pair-trend
/// checks as 4h reads; the SIDEWAYS admission rule additionally requires
/// "the EMA20/EMA50 ordering matches the intended direction", which the
/// `TrendClassification` tag alone can't recover).
async fn market_trend(scheduler: &Scheduler, symbol: &str) -> (TrendClassification, Option<f64>, Option<bool>) {
    let candles = scheduler.store.get_candles(symbol, Timeframe::H4, DISCOVERY_WINDOW).await;
    let (trend, ema_ordering) = trend_for_with_ema_ordering(&candles);
    (trend, adx(&candles, 14), ema_ordering)
}

fn trend_for(candles: &[Candle]) -> TrendClassification {
    trend_for_with_ema_ordering(candles).0
}

/// `Some(true)` when EMA20 > EMA50, `Some(false)` when EMA20 < EMA50, `None`
/// when either EMA is unavailable (spec §4.3 Screen 1 SIDEWAYS branch).
fn trend_for_with_ema_ordering(candles: &[Candle]) -> (TrendClassification, Option<bool>) {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let ema20 = ema_series(&closes, 20).last().copied().flatten();
    let ema50 = ema_series(&closes, 50).last().copied().flatten();
    let trend = classify_trend(ema20, ema50, adx(candles, 14));
    let ordering = match (ema20, ema50) {
        (Some(e20), Some(e50)) => Some(e20 > e50),
        _ => None,
    };
    (trend, ordering)
}

async fn analyze_pair(
    scheduler: &Scheduler,
    pair: &Pair,
    btc_trend: TrendClassification,
    btc_adx: Option<f64>,
    btc_ema_ordering: Option<bool>,
    now: DateTime<Utc>,
) -> anyhow::Result<u32> {
    let h1_candles = scheduler.store.get_candles(&pair.symbol, Timeframe::H1, DISCOVERY_WINDOW).await;
    if h1_candles.len() < MIN_OSCILLATOR_HISTORY {
        debug!(pair = %pair.symbol, have = h1_candles.len(), "insufficient 1h history, skipping analysis");
        return Ok(0);
    }
    let h1_closes: Vec<f64> = h1_candles.iter().map(|c| c.close).collect();
    let current_price = *h1_closes.last().expect("non-empty, checked above");

    let h4_candles = scheduler.store.get_candles(&pair.symbol, Timeframe::H4, DISCOVERY_WINDOW).await;
    let pair_trend = trend_for(&h4_candles);

    let rsi14 = rsi(&h1_closes, 14);
    let macd_latest = macd_series(&h1_closes, 12, 26, 9).last().copied().flatten();

    let since_ms = now.timestamp_millis() - scheduler.signal_cfg.duplicate_window_hours * 3_600_000;
    let mut existing_signals = scheduler.storage.load_recent_signals(&pair.symbol, since_ms).await?;

    let lifecycle = Lifecycle::new(scheduler.storage.as_ref(), &scheduler.signal_cfg);
    let mut emitted = 0u32;

    for timeframe in CORE_TIMEFRAMES {
        let candles = match timeframe {
            Timeframe::H1 => h1_candles.clone(),
            Timeframe::H4 => h4_candles.clone(),
            _ => scheduler.store.get_candles(&pair.symbol, timeframe, DISCOVERY_WINDOW).await,
        };

        let min_span = scheduler.level_cfg.fractal_lookback * 2 + 1;
        if candles.len() < min_span {
            continue;
        }

        let tf_trend = if timeframe == Timeframe::H4 { pair_trend } else { trend_for(&candles) };

        let discovered = scheduler.level_engine.discover(&pair.symbol, timeframe, &candles, tf_trend, now);
        let existing_levels = scheduler.storage.load_levels(&pair.symbol, timeframe).await?;
        let merged = merge_levels(existing_levels, discovered);

        let mut kept = Vec::with_capacity(merged.len());
        for level in merged {
            if let Some(reason) = eviction_reason(&level, current_price, &candles, &scheduler.level_cfg, now) {
                debug!(pair = %pair.symbol, level_id = level.id, price = level.price, %reason, "evicting level");
                scheduler.storage.delete_level(&level.id.to_string()).await?;
            } else {
                kept.push(level);
            }
        }

        for level in kept.iter_mut() {
            let is_live_touch = is_new_live_test(
                level.price,
                current_price,
                *scheduler.level_cfg.live_touch_tolerance,
                level.last_touch,
                now,
                scheduler.level_cfg.live_touch_min_interval_minutes,
            );
            if is_live_touch {
                level.live_test_count += 1;
                level.last_touch = now;
            }

            let direction = direction_for(level);
            let distance_pct = level.distance_pct(current_price);
            let cache_key = VerdictCache::key(&pair.symbol, level.price, &direction.to_string());
            let fresh_for = chrono::Duration::seconds(scheduler.filter_cfg.verdict_fresh_for_signal_secs);

            let verdict = match scheduler.verdict_cache.get(&cache_key, fresh_for).await {
                Some(cached) => cached,
                None => {
                    let screen1 = evaluate_screen1(btc_trend, btc_adx, btc_ema_ordering, tf_trend, direction, level.score.total());
                    let screen2 = evaluate_screen2(level.price, direction, current_price, &h1_closes, rsi14, macd_latest);
                    let policy = evaluate_policy(
                        &scheduler.filter_cfg,
                        level.score.total(),
                        timeframe,
                        tf_trend,
                        distance_pct,
                        level.live_test_count,
                        direction,
                        None,
                    );
                    let fresh = Verdict::compose(screen1, Some(screen2), policy);
                    scheduler.verdict_cache.put(cache_key, fresh.clone()).await;
                    fresh
                }
            };
            level.last_verdict = Some(CachedVerdict { verdict: verdict.clone(), computed_at: now });

            if let Some(signal) = lifecycle
                .try_emit(level, current_price, tf_trend, &verdict, is_live_touch, &existing_signals, now)
                .await?
            {
                existing_signals.push(signal);
                emitted += 1;
            }

            scheduler.storage.upsert_level(level).await?;
        }
    }

    Ok(emitted)
}
