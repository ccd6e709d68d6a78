use strum_macros::Display;

/// Outcome of one individual check within a screen (BTC trend, RSI, ...).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum Screen {
    #[strum(to_string = "screen1_4h_trend")]
    Screen1Trend,
    #[strum(to_string = "screen2_1h_oscillators")]
    Screen2Oscillators,
    /// Reserved third screen (§4.3): never evaluated, kept as an explicit
    /// disabled variant so the chain's shape matches the spec.
    #[strum(to_string = "screen3_reserved")]
    Reserved,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Screen1Result {
    pub btc_market_trend: CheckResult,
    pub pair_trend: CheckResult,
}

impl Screen1Result {
    pub fn passed(&self) -> bool {
        self.btc_market_trend.passed && self.pair_trend.passed
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Screen2Result {
    pub approach_direction: CheckResult,
    pub rsi: CheckResult,
    pub macd: CheckResult,
}

impl Screen2Result {
    pub fn passed(&self) -> bool {
        self.approach_direction.passed && self.rsi.passed && self.macd.passed
    }
}

/// Record-of-records verdict for a (pair, level, prospective direction)
/// candidate, keyed by screen name as described in spec §9 DESIGN NOTES.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Verdict {
    pub screen1: Screen1Result,
    pub screen2_evaluated: bool,
    pub screen2: Screen2Result,
    pub policy: CheckResult,
    pub admit: bool,
    pub blocked_reason: Option<String>,
}

impl Verdict {
    /// Composes the final verdict from each stage's result, recording the
    /// first failing check's detail as `blocked_reason` (§4.3).
    pub fn compose(screen1: Screen1Result, screen2: Option<Screen2Result>, policy: CheckResult) -> Self {
        let mut v = Verdict {
            screen2_evaluated: screen2.is_some(),
            screen1: screen1.clone(),
            screen2: screen2.clone().unwrap_or_default(),
            policy: policy.clone(),
            admit: false,
            blocked_reason: None,
        };

        if !screen1.btc_market_trend.passed {
            v.blocked_reason = Some(screen1.btc_market_trend.detail.clone());
            return v;
        }
        if !screen1.pair_trend.passed {
            v.blocked_reason = Some(screen1.pair_trend.detail.clone());
            return v;
        }

        let Some(screen2) = screen2 else {
            // Screen 1 passed but Screen 2 was never evaluated (caller's choice).
            v.blocked_reason = Some("screen2 not evaluated".to_string());
            return v;
        };

        if !screen2.approach_direction.passed {
            v.blocked_reason = Some(screen2.approach_direction.detail.clone());
            return v;
        }
        if !screen2.rsi.passed {
            v.blocked_reason = Some(screen2.rsi.detail.clone());
            return v;
        }
        if !screen2.macd.passed {
            v.blocked_reason = Some(screen2.macd.detail.clone());
            return v;
        }
        if !policy.passed {
            v.blocked_reason = Some(policy.detail.clone());
            return v;
        }

        v.admit = true;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failing_check_becomes_blocked_reason() {
        let screen1 = Screen1Result {
            btc_market_trend: CheckResult::fail("BTC trend UNKNOWN"),
            pair_trend: CheckResult::pass("ok"),
        };
        let v = Verdict::compose(screen1, None, CheckResult::pass("ok"));
        assert!(!v.admit);
        assert_eq!(v.blocked_reason.as_deref(), Some("BTC trend UNKNOWN"));
    }

    #[test]
    fn all_checks_passing_admits() {
        let screen1 = Screen1Result {
            btc_market_trend: CheckResult::pass("ok"),
            pair_trend: CheckResult::pass("ok"),
        };
        let screen2 = Screen2Result {
            approach_direction: CheckResult::pass("ok"),
            rsi: CheckResult::pass("ok"),
            macd: CheckResult::pass("ok"),
        };
        let v = Verdict::compose(screen1, Some(screen2), CheckResult::pass("ok"));
        assert!(v.admit);
        assert!(v.blocked_reason.is_none());
    }
}
