use std::ops::Deref;

/// A fractional percentage (0.003 == 0.3%), clamped to `[0, 1]` at
/// construction. Generalises the teacher's `config::types` newtypes
/// (`PhPct`, `VolatilityPct`) to every percent-shaped tunable in this
/// crate so a bare `f64` can never be passed where a percent was meant.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Pct(f64);

impl Pct {
    pub const fn new(val: f64) -> Self {
        let v = if val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    pub fn format_pct(&self) -> String {
        format!("{:.3}%", self.0 * 100.0)
    }
}

impl Deref for Pct {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl std::fmt::Display for Pct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_unit_interval() {
        assert_eq!(*Pct::new(-1.0), 0.0);
        assert_eq!(*Pct::new(2.0), 1.0);
        assert_eq!(*Pct::new(0.3), 0.3);
    }
}
