//! All tunables are discoverable and have defaults (spec §6). Each
//! component's configuration lives in its own file, mirroring the
//! teacher's one-struct-per-concern layout (`config/binance.rs`,
//! `config/analysis.rs`, ...).

mod filter;
mod level;
mod scheduler;
mod signal;
mod types;
mod universe;

pub use filter::FilterConfig;
pub use level::LevelConfig;
pub use scheduler::SchedulerConfig;
pub use signal::SignalConfig;
pub use types::Pct;
pub use universe::{default_universe, MARKET_REFERENCE_SYMBOL};

/// The full, composed configuration surface for a running core.
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    pub level: LevelConfig,
    pub filter: FilterConfig,
    pub signal: SignalConfig,
    pub scheduler: SchedulerConfig,
}
