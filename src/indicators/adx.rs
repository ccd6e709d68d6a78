use crate::domain::Candle;

/// Wilder's ADX(period) from a candle series. Needs roughly `2 * period`
/// bars to produce a value; returns `None` otherwise.
pub fn adx(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let mut tr = Vec::with_capacity(candles.len() - 1);
    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);

    for w in candles.windows(2) {
        let (prev, cur) = (w[0], w[1]);
        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });

        let range = (cur.high - cur.low)
            .max((cur.high - prev.close).abs())
            .max((cur.low - prev.close).abs());
        tr.push(range);
    }

    if tr.len() < period {
        return None;
    }

    let wilder_smooth = |values: &[f64]| -> Vec<f64> {
        let mut smoothed = Vec::with_capacity(values.len());
        let seed: f64 = values[..period].iter().sum();
        smoothed.push(seed);
        for &v in &values[period..] {
            let prev = *smoothed.last().unwrap();
            smoothed.push(prev - (prev / period as f64) + v);
        }
        smoothed
    };

    let tr_smooth = wilder_smooth(&tr);
    let plus_smooth = wilder_smooth(&plus_dm);
    let minus_smooth = wilder_smooth(&minus_dm);

    let mut dx_values = Vec::with_capacity(tr_smooth.len());
    for i in 0..tr_smooth.len() {
        if tr_smooth[i].abs() < f64::EPSILON {
            dx_values.push(0.0);
            continue;
        }
        let plus_di = 100.0 * plus_smooth[i] / tr_smooth[i];
        let minus_di = 100.0 * minus_smooth[i] / tr_smooth[i];
        let di_sum = plus_di + minus_di;
        let dx = if di_sum.abs() < f64::EPSILON {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        };
        dx_values.push(dx);
    }

    if dx_values.len() < period {
        return None;
    }
    Some(dx_values[dx_values.len() - period..].iter().sum::<f64>() / period as f64)
}
