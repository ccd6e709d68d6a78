use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::SignalConfig;
use crate::domain::{ExitReason, Level, Signal, SignalStatus, TrendClassification};
use crate::filters::Verdict;
use crate::storage::Storage;

use super::{admission, dedup, emission, outcome};

/// Ties admission, deduplication, and emission together for one (level,
/// current price) candidate, logging every transition to the
/// `signal_live_logs` audit trail.
pub struct Lifecycle<'a> {
    storage: &'a dyn Storage,
    cfg: &'a SignalConfig,
}

impl<'a> Lifecycle<'a> {
    pub fn new(storage: &'a dyn Storage, cfg: &'a SignalConfig) -> Self {
        Self { storage, cfg }
    }

    /// Runs admission and dedup for `level` against `current_price`; on
    /// success, persists a new ACTIVE signal and returns it. Returns `Ok(None)`
    /// when the candidate is not admitted or is a duplicate of an existing
    /// signal — never an error in those cases. On either emission or
    /// duplicate-suppression, `level.signal_generated` is marked (spec §4.4
    /// "Deduplication": "the level is marked `signal_generated` but not
    /// evicted"); it is left untouched when the candidate was never admitted.
    pub async fn try_emit(
        &self,
        level: &mut Level,
        current_price: f64,
        current_trend: TrendClassification,
        verdict: &Verdict,
        is_live_touch: bool,
        existing_signals: &[Signal],
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Signal>> {
        if !admission::is_admitted(level, current_price, verdict.admit, is_live_touch, self.cfg) {
            return Ok(None);
        }

        self.log_event(level.id, "admitted", &format!("price={current_price:.8}"), now).await?;

        let direction = admission::direction_for(level);
        let blocker = dedup::find_blocker(
            existing_signals,
            &level.pair_symbol,
            level.price,
            *self.cfg.duplicate_price_tolerance,
            now,
            self.cfg.duplicate_window_hours,
        );

        if let Some(blocker) = blocker {
            self.log_event(
                level.id,
                "duplicate_suppressed",
                &format!("blocked by signal {} status={}", blocker.id, blocker.status),
                now,
            )
            .await?;
            level.signal_generated = true;
            return Ok(None);
        }

        let mut signal = emission::emit(level, current_trend, verdict, self.cfg, now);
        self.storage.insert_signal(&signal).await?;
        // SQLite's rowid is only known after insert; reload it so callers
        // (dedup, outcome updates) can key off a real id.
        if let Some(persisted) = self
            .storage
            .load_recent_signals(&level.pair_symbol, now.timestamp_millis() - 1000)
            .await?
            .into_iter()
            .find(|s| s.entry_price == signal.entry_price && s.timestamp == signal.timestamp)
        {
            signal.id = persisted.id;
        }

        level.signal_generated = true;
        info!(pair = %level.pair_symbol, direction = %direction, price = level.price, "signal emitted");
        self.log_event(level.id, "emitted", &format!("signal_id={} direction={direction}", signal.id), now)
            .await?;

        Ok(Some(signal))
    }

    /// Rescans outcome bars for one ACTIVE signal and persists the update.
    pub async fn update_outcome(&self, signal: &mut Signal, bars: &[(DateTime<Utc>, f64)], now: DateTime<Utc>) -> anyhow::Result<()> {
        let had_result = signal.result_fixed;
        outcome::recompute(signal, bars, self.cfg);
        self.storage.update_signal(signal).await?;

        if signal.result_fixed.is_some() && had_result.is_none() {
            self.log_event(signal.id, "result_fixed", "fixed result determined", now).await?;
        }
        Ok(())
    }

    /// Closes a signal (manual or exchange-driven exit), pins MFE for
    /// sub-60s losers, and persists.
    pub async fn close(&self, signal: &mut Signal, exit_price: f64, exit_reason: ExitReason, now: DateTime<Utc>) -> anyhow::Result<()> {
        signal.status = SignalStatus::Closed;
        signal.exit_price = Some(exit_price);
        signal.exit_timestamp = Some(now);
        signal.exit_reason = Some(exit_reason);

        outcome::pin_mfe_for_short_losing_trade(signal, self.cfg);
        self.storage.update_signal(signal).await?;
        self.log_event(signal.id, "closed", &format!("reason={exit_reason} exit_price={exit_price:.8}"), now)
            .await?;
        Ok(())
    }

    /// Archives signals past the retention window (§4.5 "Stale-signal
    /// cleanup"): closes any still-ACTIVE ones first, then marks archived.
    pub async fn archive_stale(&self, signals: &mut [Signal], now: DateTime<Utc>) -> anyhow::Result<u32> {
        let mut archived = 0;
        for signal in signals.iter_mut() {
            let age_days = (now - signal.timestamp).num_days();
            if age_days < self.cfg.retention_days || signal.archived {
                continue;
            }

            if signal.status == SignalStatus::Active {
                self.close(signal, signal.entry_price, ExitReason::RetentionExpired, now).await?;
            }
            signal.archived = true;
            self.storage.update_signal(signal).await?;
            self.log_event(signal.id, "archived", "retention window elapsed", now).await?;
            archived += 1;
        }
        Ok(archived)
    }

    async fn log_event(&self, subject_id: i64, event: &str, detail: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        debug!(subject_id, event, detail, "signal lifecycle event");
        self.storage.log_event(&subject_id.to_string(), event, detail, now.timestamp_millis()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CachedVerdict, LevelType, ScoreBreakdown, Timeframe};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingStorage {
        events: StdMutex<Vec<(String, String, String)>>,
        inserted: StdMutex<Vec<Signal>>,
    }

    #[async_trait]
    impl Storage for RecordingStorage {
        async fn initialize(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn load_pairs(&self) -> anyhow::Result<Vec<crate::domain::Pair>> {
            Ok(vec![])
        }
        async fn upsert_pair(&self, _pair: &crate::domain::Pair) -> anyhow::Result<()> {
            Ok(())
        }
        async fn insert_candles(&self, _symbol: &str, _timeframe: Timeframe, _candles: &[crate::domain::Candle]) -> anyhow::Result<u64> {
            Ok(0)
        }
        async fn upsert_open_candle(&self, _symbol: &str, _timeframe: Timeframe, _candle: &crate::domain::Candle) -> anyhow::Result<()> {
            Ok(())
        }
        async fn load_candles(&self, _symbol: &str, _timeframe: Timeframe, _start_ms: Option<i64>) -> anyhow::Result<Vec<crate::domain::Candle>> {
            Ok(vec![])
        }
        async fn load_levels(&self, _symbol: &str, _timeframe: Timeframe) -> anyhow::Result<Vec<Level>> {
            Ok(vec![])
        }
        async fn upsert_level(&self, _level: &Level) -> anyhow::Result<()> {
            Ok(())
        }
        async fn delete_level(&self, _level_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn insert_signal(&self, signal: &Signal) -> anyhow::Result<()> {
            self.inserted.lock().unwrap().push(signal.clone());
            Ok(())
        }
        async fn update_signal(&self, _signal: &Signal) -> anyhow::Result<()> {
            Ok(())
        }
        async fn load_open_signals(&self) -> anyhow::Result<Vec<Signal>> {
            Ok(vec![])
        }
        async fn load_recent_signals(&self, _symbol: &str, _since_ms: i64) -> anyhow::Result<Vec<Signal>> {
            Ok(self.inserted.lock().unwrap().clone())
        }
        async fn log_event(&self, signal_id: &str, event: &str, detail: &str, _ts_ms: i64) -> anyhow::Result<()> {
            self.events.lock().unwrap().push((signal_id.to_string(), event.to_string(), detail.to_string()));
            Ok(())
        }
    }

    fn level() -> Level {
        Level {
            id: 7,
            pair_symbol: "BTC/USDT".into(),
            price: 100.0,
            level_type: LevelType::Support,
            timeframe: Timeframe::H1,
            historical_touches: 3,
            live_test_count: 0,
            score: ScoreBreakdown::default(),
            created_at: Utc::now(),
            first_touch: Utc::now(),
            last_touch: Utc::now(),
            is_active: true,
            last_verdict: Option::<CachedVerdict>::None,
            signal_generated: false,
        }
    }

    #[tokio::test]
    async fn admitted_candidate_emits_and_logs() {
        let storage = RecordingStorage::default();
        let cfg = SignalConfig::default();
        let lifecycle = Lifecycle::new(&storage, &cfg);

        let verdict = Verdict {
            admit: true,
            ..Default::default()
        };

        let result = lifecycle
            .try_emit(&mut level(), 100.3, TrendClassification::UpWeak, &verdict, false, &[], Utc::now())
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(storage.inserted.lock().unwrap().len(), 1);
        assert!(storage.events.lock().unwrap().iter().any(|(_, e, _)| e == "emitted"));
    }

    #[tokio::test]
    async fn failing_verdict_never_emits() {
        let storage = RecordingStorage::default();
        let cfg = SignalConfig::default();
        let lifecycle = Lifecycle::new(&storage, &cfg);

        let verdict = Verdict::default();
        let mut lvl = level();
        let result = lifecycle
            .try_emit(&mut lvl, 100.3, TrendClassification::UpWeak, &verdict, false, &[], Utc::now())
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(storage.inserted.lock().unwrap().is_empty());
        assert!(!lvl.signal_generated, "not-admitted candidates leave signal_generated untouched");
    }

    #[tokio::test]
    async fn duplicate_suppression_marks_signal_generated_without_evicting() {
        let storage = RecordingStorage::default();
        let cfg = SignalConfig::default();
        let lifecycle = Lifecycle::new(&storage, &cfg);

        let verdict = Verdict {
            admit: true,
            ..Default::default()
        };
        let existing = Signal {
            id: 1,
            pair_symbol: "BTC/USDT".into(),
            direction: crate::domain::Direction::Long,
            level_price: 100.0,
            entry_price: 100.0,
            stop_loss: 99.6,
            timestamp: Utc::now(),
            trend_at_emission: TrendClassification::UpWeak,
            level_type: LevelType::Support,
            level_timeframe: Timeframe::H1,
            test_count: 0,
            status: SignalStatus::Active,
            exit_price: None,
            exit_timestamp: None,
            exit_reason: None,
            max_favorable_move_pct: 0.0,
            max_adverse_move_pct: 0.0,
            threshold_touches: Default::default(),
            elder_screens_snapshot: Verdict::default(),
            result_fixed: None,
            result_fixed_at: None,
            archived: false,
        };

        let mut lvl = level();
        let result = lifecycle
            .try_emit(&mut lvl, 100.3, TrendClassification::UpWeak, &verdict, false, std::slice::from_ref(&existing), Utc::now())
            .await
            .unwrap();

        assert!(result.is_none(), "duplicate must be suppressed, not re-emitted");
        assert!(storage.inserted.lock().unwrap().is_empty());
        assert!(lvl.signal_generated, "suppressed duplicate must still mark signal_generated");
        assert!(storage.events.lock().unwrap().iter().any(|(_, e, _)| e == "duplicate_suppressed"));
    }
}
