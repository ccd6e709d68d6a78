//! C3 — the Filter Chain (spec §4.3): Elder's triple-screen method,
//! reduced to two evaluated screens plus a universal policy filter. Every
//! candidate (pair, level, prospective direction) is run through
//! [`verdict::Verdict::compose`] and the result cached per key with a TTL
//! in [`cache`].

mod cache;
mod policy;
mod screen1_trend;
mod screen2_oscillators;
mod verdict;

pub use cache::VerdictCache;
pub use policy::evaluate_policy;
pub use screen1_trend::evaluate_screen1;
pub use screen2_oscillators::evaluate_screen2;
pub use verdict::{CheckResult, Screen, Screen1Result, Screen2Result, Verdict};
