use crate::domain::Candle;

/// One swing-high or swing-low bar found by [`find_fractals`], indexed into
/// the candle slice it was found in (spec §4.2 "Fractal discovery"),
/// grounded on `original_source/core/analysis_engine.py`'s `find_fractals`.
#[derive(Debug, Clone, Copy)]
pub struct Fractal {
    pub index: usize,
    pub price: f64,
    pub bucket_start_ms: i64,
    pub volume: f64,
    pub candle_length: f64,
}

/// Swing-highs (resistance candidates) and swing-lows (support candidates)
/// over `candles`, with the primary `lookback` half-width and, if neither
/// list is populated, a secondary pass at lookback=1 (spec §4.2).
pub fn find_fractals(candles: &[Candle], lookback: usize, fallback_lookback: usize) -> (Vec<Fractal>, Vec<Fractal>) {
    let (lows, highs) = scan(candles, lookback);
    if lows.is_empty() && highs.is_empty() && fallback_lookback < lookback {
        return scan(candles, fallback_lookback.max(1));
    }
    (lows, highs)
}

fn scan(candles: &[Candle], lookback: usize) -> (Vec<Fractal>, Vec<Fractal>) {
    if lookback == 0 || candles.len() < lookback * 2 + 1 {
        return (Vec::new(), Vec::new());
    }

    let mut minima = Vec::new();
    let mut maxima = Vec::new();

    for i in lookback..candles.len() - lookback {
        let current = &candles[i];
        let window = &candles[i - lookback..=i + lookback];

        let is_minimum = window.iter().enumerate().all(|(j, c)| j == lookback || c.low > current.low);
        if is_minimum {
            minima.push(to_fractal(i, current, current.low));
        }

        let is_maximum = window.iter().enumerate().all(|(j, c)| j == lookback || c.high < current.high);
        if is_maximum {
            maxima.push(to_fractal(i, current, current.high));
        }
    }

    (minima, maxima)
}

fn to_fractal(index: usize, candle: &Candle, price: f64) -> Fractal {
    Fractal {
        index,
        price,
        bucket_start_ms: candle.bucket_start_ms,
        volume: candle.volume,
        candle_length: candle.high - candle.low,
    }
}

/// Candles excluded from fractal discovery: the trailing `minutes` of
/// history, converted to a bar count from the series' own spacing (spec
/// §4.2 "cooling-off window").
pub fn exclude_recent_count(candles: &[Candle], minutes: i64) -> usize {
    if candles.len() < 2 || minutes <= 0 {
        return 0;
    }
    let step_ms = (candles[candles.len() - 1].bucket_start_ms - candles[candles.len() - 2].bucket_start_ms).abs();
    if step_ms <= 0 {
        return 0;
    }
    let minutes_per_candle = step_ms as f64 / 60_000.0;
    if minutes_per_candle <= 0.0 {
        return 0;
    }
    let count = (minutes as f64 / minutes_per_candle) as usize;
    count.min(candles.len().saturating_sub(1))
}

/// Candles with the cooling-off window removed from the tail (spec §4.2).
pub fn candles_for_discovery(candles: &[Candle], exclude_recent_minutes: i64) -> &[Candle] {
    let excluded = exclude_recent_count(candles, exclude_recent_minutes);
    if excluded == 0 || excluded >= candles.len() {
        candles
    } else {
        &candles[..candles.len() - excluded]
    }
}
