use tracing::debug;

use crate::domain::Direction;
use crate::indicators::MacdPoint;

use super::verdict::{CheckResult, Screen2Result};

/// Screen 2, all three checks (spec §4.3): approach direction, RSI(14),
/// MACD(12/26/9). Only evaluated once Screen 1 has passed.
pub fn evaluate_screen2(
    level_price: f64,
    direction: Direction,
    current_price: f64,
    recent_closes_1h: &[f64],
    rsi14: Option<f64>,
    macd: Option<MacdPoint>,
) -> Screen2Result {
    Screen2Result {
        approach_direction: check_approach_direction(level_price, direction, current_price, recent_closes_1h),
        rsi: check_rsi(direction, rsi14),
        macd: check_macd(direction, macd),
    }
}

fn check_approach_direction(level_price: f64, direction: Direction, current_price: f64, recent_closes: &[f64]) -> CheckResult {
    if level_price <= 0.0 || recent_closes.is_empty() {
        return CheckResult::fail("insufficient recent closes for approach check");
    }

    let distance_pct = (current_price - level_price).abs() / level_price;
    let sign = match direction {
        Direction::Long => 1.0,
        Direction::Short => -1.0,
    };

    // Positive when price sits on the admitting side (above level for LONG,
    // below level for SHORT).
    let signed_offset_pct = sign * (current_price - level_price) / level_price;
    let admitting_frac = recent_closes
        .iter()
        .filter(|&&c| sign * (c - level_price) > 0.0)
        .count() as f64
        / recent_closes.len() as f64;

    let is_definitive_breakout = signed_offset_pct < -0.01;

    if distance_pct <= 0.005 && !is_definitive_breakout {
        return CheckResult::pass("level within 0.5% of price, approach check waived");
    }

    if signed_offset_pct > 0.0 {
        if admitting_frac >= 0.4 {
            CheckResult::pass(format!("price on admitting side, {:.0}% of recent closes confirm", admitting_frac * 100.0))
        } else {
            CheckResult::fail(format!("price on admitting side but only {:.0}% of recent closes confirm", admitting_frac * 100.0))
        }
    } else if is_definitive_breakout {
        CheckResult::fail(format!("definitive breakout, {:.2}% through the level", -signed_offset_pct * 100.0))
    } else if admitting_frac > 0.5 {
        CheckResult::pass("small breakout tolerated, majority of recent closes on admitting side")
    } else {
        CheckResult::fail("small breakout not tolerated, majority of recent closes against")
    }
}

fn check_rsi(direction: Direction, rsi14: Option<f64>) -> CheckResult {
    let Some(rsi) = rsi14 else {
        return CheckResult::fail("RSI(14) unavailable (insufficient history)");
    };

    match direction {
        Direction::Long => {
            if rsi > 75.0 {
                CheckResult::fail(format!("RSI {rsi:.1} overbought, blocks LONG"))
            } else {
                if (70.0..=75.0).contains(&rsi) {
                    debug!(rsi, "RSI approaching overbought band");
                }
                CheckResult::pass(format!("RSI {rsi:.1} does not block LONG"))
            }
        }
        Direction::Short => {
            if rsi < 25.0 {
                CheckResult::fail(format!("RSI {rsi:.1} oversold, blocks SHORT"))
            } else {
                if (25.0..=30.0).contains(&rsi) {
                    debug!(rsi, "RSI approaching oversold band");
                }
                CheckResult::pass(format!("RSI {rsi:.1} does not block SHORT"))
            }
        }
    }
}

fn check_macd(direction: Direction, macd: Option<MacdPoint>) -> CheckResult {
    let Some(point) = macd else {
        return CheckResult::fail("MACD(12/26/9) unavailable (insufficient history)");
    };

    let tolerance = (point.signal.abs() * 0.005).max(0.0005);

    match direction {
        Direction::Long if point.macd < point.signal - tolerance => {
            CheckResult::fail(format!("MACD {:.5} below signal {:.5} by more than tolerance, blocks LONG", point.macd, point.signal))
        }
        Direction::Short if point.macd > point.signal + tolerance => {
            CheckResult::fail(format!("MACD {:.5} above signal {:.5} by more than tolerance, blocks SHORT", point.macd, point.signal))
        }
        _ => CheckResult::pass("MACD within neutral zone of signal line"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_blocks_on_definitive_breakout_below_support() {
        let check = check_approach_direction(100.0, Direction::Long, 98.5, &[101.0, 100.5, 99.0]);
        assert!(!check.passed);
    }

    #[test]
    fn approach_waived_when_level_within_half_percent() {
        let check = check_approach_direction(100.0, Direction::Long, 100.3, &[99.0, 99.5, 100.1]);
        assert!(check.passed);
    }

    #[test]
    fn rsi_blocks_overbought_long() {
        assert!(!check_rsi(Direction::Long, Some(80.0)).passed);
        assert!(check_rsi(Direction::Long, Some(60.0)).passed);
    }

    #[test]
    fn rsi_blocks_oversold_short() {
        assert!(!check_rsi(Direction::Short, Some(20.0)).passed);
        assert!(check_rsi(Direction::Short, Some(40.0)).passed);
    }

    #[test]
    fn macd_blocks_long_when_below_signal_beyond_tolerance() {
        let point = MacdPoint { macd: -1.0, signal: 0.5, histogram: -1.5 };
        assert!(!check_macd(Direction::Long, Some(point)).passed);
    }

    #[test]
    fn macd_allows_long_within_neutral_zone() {
        let point = MacdPoint { macd: 0.499, signal: 0.5, histogram: -0.001 };
        assert!(check_macd(Direction::Long, Some(point)).passed);
    }
}
