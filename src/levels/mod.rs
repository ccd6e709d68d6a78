//! C2 — the Level Engine (spec §4.2): fractal discovery, quality scoring,
//! touch counting, breakage detection, and eviction. [`engine::LevelEngine`]
//! is the orchestrator the scheduler drives; the submodules are the pure
//! functions it composes.

mod breakage;
mod engine;
mod eviction;
mod fractal;
mod scoring;
mod touches;
mod triangle;

pub use breakage::is_broken;
pub use engine::{merge_levels, LevelEngine};
pub use eviction::{eviction_reason, EvictionReason};
pub use fractal::{candles_for_discovery, find_fractals, Fractal};
pub use scoring::{score_level, ScoringInput};
pub use touches::{count_historical_touches, is_new_live_test};
pub use triangle::{triangle_bonus, ActiveTriangle, NoopTriangleProvider, TrianglePatternProvider};
