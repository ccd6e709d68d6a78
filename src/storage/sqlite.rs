use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

use super::Storage;
use crate::domain::{
    CachedVerdict, Candle, Direction, ExitReason, FixedResult, Level, LevelType, Pair, ScoreBreakdown, Signal,
    SignalStatus, ThresholdTouches, Timeframe, TrendClassification,
};
use crate::filters::Verdict;

/// SQLite-backed [`Storage`], the only production implementation (spec §6).
/// Nested structs (score breakdowns, cached verdicts, threshold touches)
/// are stored as JSON text columns rather than normalized further — they
/// are always read and written whole, never queried by field.
pub struct SqliteStorage {
    pool: Pool<Sqlite>,
}

impl SqliteStorage {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let connection_options = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(60))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trading_pairs (
                symbol TEXT PRIMARY KEY,
                venue TEXT NOT NULL,
                enabled INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ohlcv (
                symbol TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                bucket_start_ms INTEGER NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (symbol, timeframe, bucket_start_ms)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS levels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pair_symbol TEXT NOT NULL,
                price REAL NOT NULL,
                level_type TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                historical_touches INTEGER NOT NULL,
                live_test_count INTEGER NOT NULL,
                score_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                first_touch TEXT NOT NULL,
                last_touch TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                last_verdict_json TEXT,
                signal_generated INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pair_symbol TEXT NOT NULL,
                direction TEXT NOT NULL,
                level_price REAL NOT NULL,
                entry_price REAL NOT NULL,
                stop_loss REAL NOT NULL,
                ts TEXT NOT NULL,
                trend_at_emission TEXT NOT NULL,
                level_type TEXT NOT NULL,
                level_timeframe TEXT NOT NULL,
                test_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                exit_price REAL,
                exit_timestamp TEXT,
                exit_reason TEXT,
                max_favorable_move_pct REAL NOT NULL,
                max_adverse_move_pct REAL NOT NULL,
                threshold_touches_json TEXT NOT NULL,
                elder_screens_snapshot_json TEXT NOT NULL,
                result_fixed_json TEXT,
                result_fixed_at TEXT,
                archived INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signal_live_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                signal_id TEXT NOT NULL,
                event TEXT NOT NULL,
                detail TEXT NOT NULL,
                ts_ms INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_pairs(&self) -> anyhow::Result<Vec<Pair>> {
        let rows = sqlx::query("SELECT symbol, venue, enabled FROM trading_pairs")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| Pair {
                symbol: r.get("symbol"),
                venue: r.get("venue"),
                enabled: r.get::<i64, _>("enabled") != 0,
            })
            .collect())
    }

    async fn upsert_pair(&self, pair: &Pair) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO trading_pairs (symbol, venue, enabled) VALUES (?, ?, ?)
             ON CONFLICT(symbol) DO UPDATE SET venue = excluded.venue, enabled = excluded.enabled",
        )
        .bind(&pair.symbol)
        .bind(&pair.venue)
        .bind(pair.enabled as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_candles(&self, symbol: &str, timeframe: Timeframe, candles: &[Candle]) -> anyhow::Result<u64> {
        if candles.is_empty() {
            return Ok(0);
        }
        for chunk in candles.chunks(3000) {
            let mut qb = QueryBuilder::new(
                "INSERT OR IGNORE INTO ohlcv (symbol, timeframe, bucket_start_ms, open, high, low, close, volume) ",
            );
            qb.push_values(chunk, |mut b, c: &Candle| {
                b.push_bind(symbol)
                    .push_bind(timeframe.as_str())
                    .push_bind(c.bucket_start_ms)
                    .push_bind(c.open)
                    .push_bind(c.high)
                    .push_bind(c.low)
                    .push_bind(c.close)
                    .push_bind(c.volume);
            });
            qb.build().execute(&self.pool).await?;
        }
        Ok(candles.len() as u64)
    }

    async fn upsert_open_candle(&self, symbol: &str, timeframe: Timeframe, candle: &Candle) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO ohlcv (symbol, timeframe, bucket_start_ms, open, high, low, close, volume)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(symbol, timeframe, bucket_start_ms) DO UPDATE SET
                open = excluded.open, high = excluded.high, low = excluded.low,
                close = excluded.close, volume = excluded.volume",
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .bind(candle.bucket_start_ms)
        .bind(candle.open)
        .bind(candle.high)
        .bind(candle.low)
        .bind(candle.close)
        .bind(candle.volume)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_ms: Option<i64>,
    ) -> anyhow::Result<Vec<Candle>> {
        let rows = if let Some(start) = start_ms {
            sqlx::query(
                "SELECT bucket_start_ms, open, high, low, close, volume FROM ohlcv
                 WHERE symbol = ? AND timeframe = ? AND bucket_start_ms >= ?
                 ORDER BY bucket_start_ms ASC",
            )
            .bind(symbol)
            .bind(timeframe.as_str())
            .bind(start)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT bucket_start_ms, open, high, low, close, volume FROM ohlcv
                 WHERE symbol = ? AND timeframe = ?
                 ORDER BY bucket_start_ms ASC",
            )
            .bind(symbol)
            .bind(timeframe.as_str())
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows
            .iter()
            .map(|r| {
                Candle::new(
                    r.get("bucket_start_ms"),
                    r.get("open"),
                    r.get("high"),
                    r.get("low"),
                    r.get("close"),
                    r.get("volume"),
                )
            })
            .collect())
    }

    async fn load_levels(&self, symbol: &str, timeframe: Timeframe) -> anyhow::Result<Vec<Level>> {
        let rows = sqlx::query(
            "SELECT id, pair_symbol, price, level_type, timeframe, historical_touches, live_test_count,
                    score_json, created_at, first_touch, last_touch, is_active, last_verdict_json, signal_generated
             FROM levels WHERE pair_symbol = ? AND timeframe = ?",
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(row_to_level(&r)?);
        }
        Ok(out)
    }

    async fn upsert_level(&self, level: &Level) -> anyhow::Result<()> {
        let score_json = serde_json::to_string(&level.score)?;
        let verdict_json = level
            .last_verdict
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        if level.id == 0 {
            sqlx::query(
                "INSERT INTO levels (pair_symbol, price, level_type, timeframe, historical_touches,
                    live_test_count, score_json, created_at, first_touch, last_touch, is_active,
                    last_verdict_json, signal_generated)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&level.pair_symbol)
            .bind(level.price)
            .bind(level.level_type.to_string())
            .bind(level.timeframe.as_str())
            .bind(level.historical_touches)
            .bind(level.live_test_count)
            .bind(score_json)
            .bind(level.created_at.to_rfc3339())
            .bind(level.first_touch.to_rfc3339())
            .bind(level.last_touch.to_rfc3339())
            .bind(level.is_active as i64)
            .bind(verdict_json)
            .bind(level.signal_generated as i64)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE levels SET price = ?, historical_touches = ?, live_test_count = ?, score_json = ?,
                    last_touch = ?, is_active = ?, last_verdict_json = ?, signal_generated = ?
                 WHERE id = ?",
            )
            .bind(level.price)
            .bind(level.historical_touches)
            .bind(level.live_test_count)
            .bind(score_json)
            .bind(level.last_touch.to_rfc3339())
            .bind(level.is_active as i64)
            .bind(verdict_json)
            .bind(level.signal_generated as i64)
            .bind(level.id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn delete_level(&self, level_id: &str) -> anyhow::Result<()> {
        let id: i64 = level_id.parse()?;
        sqlx::query("DELETE FROM levels WHERE id = ?").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_signal(&self, signal: &Signal) -> anyhow::Result<()> {
        let thresholds_json = serde_json::to_string(&signal.threshold_touches)?;
        let verdict_json = serde_json::to_string(&signal.elder_screens_snapshot)?;
        let result_json = signal.result_fixed.map(serde_json::to_string).transpose()?;

        sqlx::query(
            "INSERT INTO signals (pair_symbol, direction, level_price, entry_price, stop_loss, ts,
                trend_at_emission, level_type, level_timeframe, test_count, status, exit_price,
                exit_timestamp, exit_reason, max_favorable_move_pct, max_adverse_move_pct,
                threshold_touches_json, elder_screens_snapshot_json, result_fixed_json, result_fixed_at, archived)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&signal.pair_symbol)
        .bind(signal.direction.to_string())
        .bind(signal.level_price)
        .bind(signal.entry_price)
        .bind(signal.stop_loss)
        .bind(signal.timestamp.to_rfc3339())
        .bind(signal.trend_at_emission.to_string())
        .bind(signal.level_type.to_string())
        .bind(signal.level_timeframe.as_str())
        .bind(signal.test_count)
        .bind(signal.status.to_string())
        .bind(signal.exit_price)
        .bind(signal.exit_timestamp.map(|t| t.to_rfc3339()))
        .bind(signal.exit_reason.map(|r| r.to_string()))
        .bind(signal.max_favorable_move_pct)
        .bind(signal.max_adverse_move_pct)
        .bind(thresholds_json)
        .bind(verdict_json)
        .bind(result_json)
        .bind(signal.result_fixed_at.map(|t| t.to_rfc3339()))
        .bind(signal.archived as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_signal(&self, signal: &Signal) -> anyhow::Result<()> {
        let thresholds_json = serde_json::to_string(&signal.threshold_touches)?;
        let result_json = signal.result_fixed.map(serde_json::to_string).transpose()?;

        sqlx::query(
            "UPDATE signals SET status = ?, exit_price = ?, exit_timestamp = ?, exit_reason = ?,
                max_favorable_move_pct = ?, max_adverse_move_pct = ?, threshold_touches_json = ?,
                result_fixed_json = ?, result_fixed_at = ?, archived = ?
             WHERE id = ?",
        )
        .bind(signal.status.to_string())
        .bind(signal.exit_price)
        .bind(signal.exit_timestamp.map(|t| t.to_rfc3339()))
        .bind(signal.exit_reason.map(|r| r.to_string()))
        .bind(signal.max_favorable_move_pct)
        .bind(signal.max_adverse_move_pct)
        .bind(thresholds_json)
        .bind(result_json)
        .bind(signal.result_fixed_at.map(|t| t.to_rfc3339()))
        .bind(signal.archived as i64)
        .bind(signal.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_open_signals(&self) -> anyhow::Result<Vec<Signal>> {
        let rows = sqlx::query("SELECT * FROM signals WHERE status = 'ACTIVE'")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_signal).collect()
    }

    async fn load_recent_signals(&self, symbol: &str, since_ms: i64) -> anyhow::Result<Vec<Signal>> {
        let since = DateTime::<Utc>::from_timestamp_millis(since_ms).unwrap_or_else(Utc::now);
        let rows = sqlx::query("SELECT * FROM signals WHERE pair_symbol = ? AND ts >= ?")
            .bind(symbol)
            .bind(since.to_rfc3339())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_signal).collect()
    }

    async fn log_event(&self, signal_id: &str, event: &str, detail: &str, ts_ms: i64) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO signal_live_logs (signal_id, event, detail, ts_ms) VALUES (?, ?, ?, ?)")
            .bind(signal_id)
            .bind(event)
            .bind(detail)
            .bind(ts_ms)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn parse_dt(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn row_to_level(r: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Level> {
    let level_type: String = r.get("level_type");
    let timeframe: String = r.get("timeframe");
    let score_json: String = r.get("score_json");
    let verdict_json: Option<String> = r.get("last_verdict_json");

    Ok(Level {
        id: r.get("id"),
        pair_symbol: r.get("pair_symbol"),
        price: r.get("price"),
        level_type: if level_type == "support" { LevelType::Support } else { LevelType::Resistance },
        timeframe: Timeframe::parse(&timeframe).unwrap_or(Timeframe::H1),
        historical_touches: r.get::<i64, _>("historical_touches") as u32,
        live_test_count: r.get::<i64, _>("live_test_count") as u32,
        score: serde_json::from_str::<ScoreBreakdown>(&score_json)?,
        created_at: parse_dt(&r.get::<String, _>("created_at"))?,
        first_touch: parse_dt(&r.get::<String, _>("first_touch"))?,
        last_touch: parse_dt(&r.get::<String, _>("last_touch"))?,
        is_active: r.get::<i64, _>("is_active") != 0,
        last_verdict: verdict_json.map(|j| serde_json::from_str::<CachedVerdict>(&j)).transpose()?,
        signal_generated: r.get::<i64, _>("signal_generated") != 0,
    })
}

fn row_to_signal(r: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Signal> {
    let direction: String = r.get("direction");
    let level_type: String = r.get("level_type");
    let level_timeframe: String = r.get("level_timeframe");
    let status: String = r.get("status");
    let trend: String = r.get("trend_at_emission");
    let exit_reason: Option<String> = r.get("exit_reason");
    let exit_ts: Option<String> = r.get("exit_timestamp");
    let result_json: Option<String> = r.get("result_fixed_json");
    let result_at: Option<String> = r.get("result_fixed_at");

    Ok(Signal {
        id: r.get("id"),
        pair_symbol: r.get("pair_symbol"),
        direction: if direction == "LONG" { Direction::Long } else { Direction::Short },
        level_price: r.get("level_price"),
        entry_price: r.get("entry_price"),
        stop_loss: r.get("stop_loss"),
        timestamp: parse_dt(&r.get::<String, _>("ts"))?,
        trend_at_emission: parse_trend(&trend),
        level_type: if level_type == "support" { LevelType::Support } else { LevelType::Resistance },
        level_timeframe: Timeframe::parse(&level_timeframe).unwrap_or(Timeframe::H1),
        test_count: r.get::<i64, _>("test_count") as u32,
        status: if status == "ACTIVE" { SignalStatus::Active } else { SignalStatus::Closed },
        exit_price: r.get("exit_price"),
        exit_timestamp: exit_ts.map(|s| parse_dt(&s)).transpose()?,
        exit_reason: exit_reason.map(|s| parse_exit_reason(&s)),
        max_favorable_move_pct: r.get("max_favorable_move_pct"),
        max_adverse_move_pct: r.get("max_adverse_move_pct"),
        threshold_touches: serde_json::from_str::<ThresholdTouches>(&r.get::<String, _>("threshold_touches_json"))?,
        elder_screens_snapshot: serde_json::from_str::<Verdict>(&r.get::<String, _>("elder_screens_snapshot_json"))?,
        result_fixed: result_json.map(|j| serde_json::from_str::<FixedResult>(&j)).transpose()?,
        result_fixed_at: result_at.map(|s| parse_dt(&s)).transpose()?,
        archived: r.get::<i64, _>("archived") != 0,
    })
}

fn parse_trend(s: &str) -> TrendClassification {
    match s {
        "UP_STRONG" => TrendClassification::UpStrong,
        "UP_WEAK" => TrendClassification::UpWeak,
        "DOWN_STRONG" => TrendClassification::DownStrong,
        "DOWN_WEAK" => TrendClassification::DownWeak,
        "SIDEWAYS" => TrendClassification::Sideways,
        _ => TrendClassification::Unknown,
    }
}

fn parse_exit_reason(s: &str) -> ExitReason {
    match s {
        "favourable_threshold" => ExitReason::FavourableThreshold,
        "adverse_threshold" => ExitReason::AdverseThreshold,
        "retention_expired" => ExitReason::RetentionExpired,
        _ => ExitReason::Manual,
    }
}
