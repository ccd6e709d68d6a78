use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use level_sniper::config::{default_universe, CoreConfig};
use level_sniper::exchange::BinanceClient;
use level_sniper::levels::{LevelEngine, NoopTriangleProvider};
use level_sniper::storage::{SqliteStorage, Storage};
use level_sniper::store::OhlcvStore;
use level_sniper::Scheduler;

#[derive(Parser, Debug)]
#[command(author, version, about = "Real-time support/resistance signal engine", long_about = None)]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, default_value = "level-sniper.db")]
    db_path: String,

    /// Per-request timeout for exchange REST calls, in seconds.
    #[arg(long, default_value_t = 10)]
    exchange_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = CoreConfig::default();

    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&cli.db_path).await?);
    storage.initialize().await?;

    let exchange = Arc::new(BinanceClient::new(Duration::from_secs(cli.exchange_timeout_secs))?);
    let store = Arc::new(OhlcvStore::new(storage.clone(), exchange));
    let level_engine = Arc::new(LevelEngine::new(cfg.level.clone(), Arc::new(NoopTriangleProvider)));

    let pairs = default_universe();
    for pair in &pairs {
        storage.upsert_pair(pair).await?;
    }
    info!(pairs = pairs.len(), db_path = %cli.db_path, "level-sniper starting");

    let scheduler = Scheduler::new(storage, store, level_engine, pairs, cfg.level, cfg.filter, cfg.signal, cfg.scheduler);

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining in-flight jobs");
    shutdown_signal.cancel();
    scheduler_handle.await?;

    Ok(())
}
