use strum_macros::{Display, EnumIter};

/// EMA20/EMA50/ADX(14)-derived directional classification, computed
/// independently on any timeframe/pair series (§3 TrendClassification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, serde::Serialize, serde::Deserialize)]
pub enum TrendClassification {
    #[strum(to_string = "UP_STRONG")]
    UpStrong,
    #[strum(to_string = "UP_WEAK")]
    UpWeak,
    #[strum(to_string = "DOWN_STRONG")]
    DownStrong,
    #[strum(to_string = "DOWN_WEAK")]
    DownWeak,
    #[strum(to_string = "SIDEWAYS")]
    Sideways,
    #[strum(to_string = "UNKNOWN")]
    Unknown,
}

impl TrendClassification {
    pub fn is_up(self) -> bool {
        matches!(self, Self::UpStrong | Self::UpWeak)
    }

    pub fn is_down(self) -> bool {
        matches!(self, Self::DownStrong | Self::DownWeak)
    }
}

/// Direction derived from a level's type (support => LONG, resistance =>
/// SHORT) and the direction a trend classification or EMA ordering admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    #[strum(to_string = "LONG")]
    Long,
    #[strum(to_string = "SHORT")]
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Classify EMA20/EMA50/ADX(14) into a [`TrendClassification`], the rule
/// shared by Screen 1's BTC-market and pair-trend checks (§4.3).
pub fn classify_trend(ema20: Option<f64>, ema50: Option<f64>, adx14: Option<f64>) -> TrendClassification {
    let (Some(ema20), Some(ema50), Some(adx)) = (ema20, ema50, adx14) else {
        return TrendClassification::Unknown;
    };

    if ema50.abs() < f64::EPSILON {
        return TrendClassification::Unknown;
    }

    let gap_pct = (ema20 - ema50) / ema50;

    // ADX below 25 is not enough directional force to call a trend; the
    // EMA ordering still matters for Screen 1's SIDEWAYS admission rule,
    // but the classification itself stays SIDEWAYS.
    if adx < 25.0 {
        return TrendClassification::Sideways;
    }

    if ema20 > ema50 {
        if gap_pct >= 0.003 {
            TrendClassification::UpStrong
        } else {
            TrendClassification::UpWeak
        }
    } else if ema20 < ema50 {
        if gap_pct <= -0.003 {
            TrendClassification::DownStrong
        } else {
            TrendClassification::DownWeak
        }
    } else {
        TrendClassification::Sideways
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_inputs_yield_unknown() {
        assert_eq!(classify_trend(None, Some(1.0), Some(20.0)), TrendClassification::Unknown);
    }

    #[test]
    fn strong_uptrend_needs_adx_and_gap() {
        let t = classify_trend(Some(110.0), Some(100.0), Some(30.0));
        assert_eq!(t, TrendClassification::UpStrong);
    }

    #[test]
    fn flat_emas_with_low_adx_are_sideways() {
        let t = classify_trend(Some(100.05), Some(100.0), Some(12.0));
        assert_eq!(t, TrendClassification::Sideways);
    }

    #[test]
    fn moderate_adx_with_ema20_above_ema50_is_still_sideways() {
        // Scenario: BTC 4h, ADX 22, EMA20 60050 > EMA50 59900.
        let t = classify_trend(Some(60_050.0), Some(59_900.0), Some(22.0));
        assert_eq!(t, TrendClassification::Sideways);
    }
}
