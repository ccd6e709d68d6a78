use crate::config::FilterConfig;
use crate::domain::{Direction, Timeframe, TrendClassification};

use super::verdict::CheckResult;

/// Universal policy filter (spec §4.3): applies regardless of how the
/// Elder screens voted. Triangle-bias enforcement mirrors the §4.2 bonus
/// but is a no-op while the triangle-pattern subsystem is absent
/// (`triangle_bias` is `None` until that provider exists, see DESIGN.md).
#[allow(clippy::too_many_arguments)]
pub fn evaluate_policy(
    cfg: &FilterConfig,
    level_score: f64,
    timeframe: Timeframe,
    trend: TrendClassification,
    distance_pct: f64,
    test_count: u32,
    direction: Direction,
    triangle_bias: Option<Direction>,
) -> CheckResult {
    let min_score = cfg.min_score_for(timeframe);
    if level_score < min_score {
        return CheckResult::fail(format!("level score {level_score:.1} below minimum {min_score:.1} for {timeframe}"));
    }

    if trend == TrendClassification::Sideways && cfg.block_sideways {
        return CheckResult::fail("trend context SIDEWAYS and block_sideways policy is on");
    }

    if distance_pct > cfg.max_distance_pct {
        return CheckResult::fail(format!(
            "distance {:.3}% exceeds max_distance_pct {:.3}%",
            distance_pct * 100.0,
            cfg.max_distance_pct * 100.0
        ));
    }

    if test_count > cfg.max_test_count {
        return CheckResult::fail(format!("test_count {test_count} exceeds max_test_count {}", cfg.max_test_count));
    }

    if level_score < cfg.off_trend_score_override {
        if let Some(bias) = triangle_bias {
            if bias != direction {
                return CheckResult::fail("active triangle bias contradicts signal on a weak score");
            }
        }
    }

    CheckResult::pass("policy checks satisfied")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_below_timeframe_min_score() {
        let cfg = FilterConfig::default();
        let result = evaluate_policy(&cfg, 10.0, Timeframe::H1, TrendClassification::UpStrong, 0.001, 0, Direction::Long, None);
        assert!(!result.passed);
    }

    #[test]
    fn blocks_on_distance_and_test_count() {
        let cfg = FilterConfig::default();
        let far = evaluate_policy(&cfg, 90.0, Timeframe::H1, TrendClassification::UpStrong, 0.02, 0, Direction::Long, None);
        assert!(!far.passed);

        let overtested = evaluate_policy(&cfg, 90.0, Timeframe::H1, TrendClassification::UpStrong, 0.001, 10, Direction::Long, None);
        assert!(!overtested.passed);
    }

    #[test]
    fn triangle_bias_only_enforced_on_weak_scores() {
        let cfg = FilterConfig::default();
        let weak_contradicted = evaluate_policy(
            &cfg, 25.0, Timeframe::H1, TrendClassification::UpStrong, 0.001, 0, Direction::Long, Some(Direction::Short),
        );
        assert!(!weak_contradicted.passed);

        let strong_contradicted = evaluate_policy(
            &cfg, 90.0, Timeframe::H1, TrendClassification::UpStrong, 0.001, 0, Direction::Long, Some(Direction::Short),
        );
        assert!(strong_contradicted.passed, "strong score should not be gated by triangle bias");
    }
}
