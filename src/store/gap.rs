use crate::domain::{Candle, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSpan {
    pub from_ms: i64,
    pub to_ms: i64,
}

/// First pair of adjacent candles whose spacing exceeds 1.5x the
/// timeframe's bucket width (spec §4.1 "interior gap").
pub fn first_interior_gap(candles: &[Candle], timeframe: Timeframe) -> Option<GapSpan> {
    let step = timeframe.duration_ms();
    let threshold = (step as f64 * 1.5) as i64;

    candles.windows(2).find_map(|w| {
        let span = w[1].bucket_start_ms - w[0].bucket_start_ms;
        if span > threshold {
            Some(GapSpan {
                from_ms: w[0].bucket_start_ms + step,
                to_ms: w[1].bucket_start_ms,
            })
        } else {
            None
        }
    })
}
