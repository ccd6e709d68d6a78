use crate::domain::{Direction, LevelType, Timeframe};

/// An active triangle chart pattern's relevant facts for level scoring and
/// policy enforcement (spec §4.2 "triangle pattern bonus", §4.3 "universal
/// policy filter"). The detection logic itself is out of scope (spec §1,
/// §9 Open Questions) — this is only the shape of what such a subsystem
/// would report.
#[derive(Debug, Clone, Copy)]
pub struct ActiveTriangle {
    /// Price of the triangle border nearest the level under evaluation.
    pub nearest_border_price: f64,
    /// Width of the triangle at the level's price, used to normalise how
    /// far "inward" from the border the level sits.
    pub span: f64,
    /// Which direction a breakout of this triangle would favour, if any.
    pub directional_bias: Option<Direction>,
}

/// Seam for the external chart-pattern subsystem (spec §1, §9). The core
/// ships only [`NoopTriangleProvider`]; a real implementation is an
/// external collaborator wired in at startup.
pub trait TrianglePatternProvider: Send + Sync {
    fn active_triangle(&self, pair_symbol: &str, timeframe: Timeframe, price: f64) -> Option<ActiveTriangle>;
}

pub struct NoopTriangleProvider;

impl TrianglePatternProvider for NoopTriangleProvider {
    fn active_triangle(&self, _pair_symbol: &str, _timeframe: Timeframe, _price: f64) -> Option<ActiveTriangle> {
        None
    }
}

/// Triangle bonus (0-50), peaking when the level coincides with the
/// triangle's border and decaying inward; a small penalty applies to
/// levels found while no triangle is active (spec §4.2).
pub fn triangle_bonus(level_price: f64, _level_type: LevelType, triangle: Option<&ActiveTriangle>) -> f64 {
    match triangle {
        Some(t) if t.span > 0.0 => {
            let distance = (level_price - t.nearest_border_price).abs();
            let decay = (1.0 - distance / t.span).clamp(0.0, 1.0);
            50.0 * decay
        }
        Some(_) => 25.0,
        None => -5.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonus_peaks_on_the_border_and_decays_inward() {
        let triangle = ActiveTriangle {
            nearest_border_price: 100.0,
            span: 10.0,
            directional_bias: None,
        };
        let on_border = triangle_bonus(100.0, LevelType::Support, Some(&triangle));
        let halfway = triangle_bonus(105.0, LevelType::Support, Some(&triangle));
        let outside = triangle_bonus(200.0, LevelType::Support, Some(&triangle));
        assert!((on_border - 50.0).abs() < 1e-9);
        assert!((halfway - 25.0).abs() < 1e-9);
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn no_active_triangle_applies_small_penalty() {
        assert_eq!(triangle_bonus(100.0, LevelType::Resistance, None), -5.0);
    }
}
