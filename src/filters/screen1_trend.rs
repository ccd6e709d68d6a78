use crate::domain::{Direction, TrendClassification};

use super::verdict::{CheckResult, Screen1Result};

/// Screen 1, both checks (spec §4.3): BTC market trend, then pair trend.
/// A passing pair trend can override a failing BTC trend; a failing pair
/// trend is always fatal.
///
/// `btc_ema_ordering` is `Some(true)` when BTC's 4h EMA20 > EMA50, `Some(false)`
/// when EMA20 < EMA50, and `None` when either EMA is unavailable; it only
/// matters for the SIDEWAYS branch of the BTC market-trend check.
pub fn evaluate_screen1(
    btc_trend: TrendClassification,
    btc_adx: Option<f64>,
    btc_ema_ordering: Option<bool>,
    pair_trend: TrendClassification,
    direction: Direction,
    level_score: f64,
) -> Screen1Result {
    let btc_check = check_btc_market_trend(btc_trend, btc_adx, btc_ema_ordering, direction, level_score);
    let pair_check = check_pair_trend(pair_trend, direction, level_score);

    let btc_market_trend = if !btc_check.passed && pair_check.passed {
        CheckResult::pass(format!(
            "BTC trend {btc_trend} would block, overridden by passing pair trend {pair_trend}"
        ))
    } else {
        btc_check
    };

    Screen1Result {
        btc_market_trend,
        pair_trend: pair_check,
    }
}

fn check_btc_market_trend(
    trend: TrendClassification,
    adx: Option<f64>,
    ema_ordering: Option<bool>,
    direction: Direction,
    level_score: f64,
) -> CheckResult {
    match trend {
        TrendClassification::UpStrong | TrendClassification::UpWeak => match direction {
            Direction::Long => CheckResult::pass("BTC trend UP admits LONG"),
            Direction::Short if level_score > 30.0 => {
                CheckResult::pass(format!("BTC trend UP, SHORT admitted on score {level_score:.1} > 30"))
            }
            Direction::Short => CheckResult::fail("BTC trend UP blocks SHORT below score 30"),
        },
        TrendClassification::DownStrong | TrendClassification::DownWeak => match direction {
            Direction::Short => CheckResult::pass("BTC trend DOWN admits SHORT"),
            Direction::Long if level_score > 30.0 => {
                CheckResult::pass(format!("BTC trend DOWN, LONG admitted on score {level_score:.1} > 30"))
            }
            Direction::Long => CheckResult::fail("BTC trend DOWN blocks LONG below score 30"),
        },
        TrendClassification::Sideways => {
            let adx_ok = adx.is_some_and(|a| a >= 20.0);
            if !adx_ok {
                return CheckResult::fail("BTC trend SIDEWAYS with ADX < 20 blocks both directions");
            }
            match ema_ordering {
                // EMA20 > EMA50 admits LONG; EMA20 < EMA50 admits SHORT (spec §4.3).
                Some(ema20_above_ema50) if ema20_above_ema50 == (direction == Direction::Long) => {
                    let ordering = if ema20_above_ema50 { "EMA20 > EMA50" } else { "EMA20 < EMA50" };
                    CheckResult::pass(format!("BTC trend SIDEWAYS, ADX >= 20 and {ordering} admits {direction}"))
                }
                Some(ema20_above_ema50) => {
                    let ordering = if ema20_above_ema50 { "EMA20 > EMA50" } else { "EMA20 < EMA50" };
                    CheckResult::fail(format!("BTC trend SIDEWAYS blocks {direction}: {ordering} does not match direction"))
                }
                None => CheckResult::fail("BTC trend SIDEWAYS blocks both directions: EMA20/EMA50 unavailable"),
            }
        }
        TrendClassification::Unknown => CheckResult::fail("BTC trend UNKNOWN (insufficient history)"),
    }
}

fn check_pair_trend(trend: TrendClassification, direction: Direction, level_score: f64) -> CheckResult {
    match trend {
        TrendClassification::UpStrong | TrendClassification::UpWeak => match direction {
            Direction::Long => CheckResult::pass("pair trend UP admits LONG"),
            Direction::Short => CheckResult::fail("pair trend UP blocks SHORT"),
        },
        TrendClassification::DownStrong | TrendClassification::DownWeak => match direction {
            Direction::Short => CheckResult::pass("pair trend DOWN admits SHORT"),
            Direction::Long => CheckResult::fail("pair trend DOWN blocks LONG"),
        },
        TrendClassification::Sideways => CheckResult::pass("pair trend SIDEWAYS admits either direction"),
        TrendClassification::Unknown if level_score > 30.0 => {
            CheckResult::pass(format!("pair trend UNKNOWN, admitted on score {level_score:.1} > 30"))
        }
        TrendClassification::Unknown => CheckResult::fail("pair trend UNKNOWN blocks below score 30"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sideways_btc_with_low_adx_blocks_unless_pair_trend_overrides() {
        let screen1 = evaluate_screen1(
            TrendClassification::Sideways,
            Some(12.0),
            None,
            TrendClassification::UpStrong,
            Direction::Long,
            50.0,
        );
        assert!(screen1.btc_market_trend.passed, "pair trend UP should override");
        assert!(screen1.passed());
    }

    #[test]
    fn failing_pair_trend_is_fatal_even_if_btc_passes() {
        let screen1 = evaluate_screen1(
            TrendClassification::UpStrong,
            Some(30.0),
            None,
            TrendClassification::DownStrong,
            Direction::Long,
            50.0,
        );
        assert!(!screen1.pair_trend.passed);
        assert!(!screen1.passed());
    }

    #[test]
    fn btc_up_admits_short_only_above_score_30() {
        let low_score = evaluate_screen1(
            TrendClassification::UpStrong,
            Some(30.0),
            None,
            TrendClassification::Sideways,
            Direction::Short,
            20.0,
        );
        assert!(!low_score.btc_market_trend.passed);

        let high_score = evaluate_screen1(
            TrendClassification::UpStrong,
            Some(30.0),
            None,
            TrendClassification::Sideways,
            Direction::Short,
            40.0,
        );
        assert!(high_score.btc_market_trend.passed);
    }

    #[test]
    fn btc_sideways_with_ema20_above_ema50_admits_long_not_short() {
        // Spec §8 scenario 4: BTC 4h SIDEWAYS, ADX 22, EMA20 60050 > EMA50 59900.
        let long = evaluate_screen1(
            TrendClassification::Sideways,
            Some(22.0),
            Some(true),
            TrendClassification::Sideways,
            Direction::Long,
            45.0,
        );
        assert!(long.btc_market_trend.passed);
        assert!(long.passed());

        let short = evaluate_screen1(
            TrendClassification::Sideways,
            Some(22.0),
            Some(true),
            TrendClassification::Sideways,
            Direction::Short,
            45.0,
        );
        assert!(!short.btc_market_trend.passed);
        let reason = &short.btc_market_trend.detail;
        assert!(reason.contains("SIDEWAYS"), "reason was: {reason}");
        assert!(reason.contains("EMA20 > EMA50"), "reason was: {reason}");
    }
}
