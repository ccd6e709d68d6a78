use super::ema::ema_series;

#[derive(Debug, Clone, Copy)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD(fast, slow, signal) — default 12/26/9 (spec §4.3). Returns one
/// point per bar once the signal line's EMA has enough history; earlier
/// bars are `None`.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<MacdPoint>> {
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let macd_line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let first_valid = macd_line.iter().position(Option::is_some);
    let Some(first_valid) = first_valid else {
        return vec![None; closes.len()];
    };

    let macd_values: Vec<f64> = macd_line[first_valid..].iter().map(|v| v.unwrap()).collect();
    let signal_ema = ema_series(&macd_values, signal);

    let mut out = vec![None; closes.len()];
    for (i, sig) in signal_ema.iter().enumerate() {
        if let Some(sig) = sig {
            let macd = macd_values[i];
            out[first_valid + i] = Some(MacdPoint {
                macd,
                signal: *sig,
                histogram: macd - sig,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_series_has_no_macd_points() {
        let closes = vec![1.0; 5];
        let out = macd_series(&closes, 12, 26, 9);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn long_flat_series_converges_macd_to_zero() {
        let closes = vec![100.0; 60];
        let out = macd_series(&closes, 12, 26, 9);
        let last = out.last().unwrap().unwrap();
        assert!(last.macd.abs() < 1e-6);
        assert!(last.signal.abs() < 1e-6);
    }
}
