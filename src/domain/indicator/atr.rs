//! Average True Range.
//!
//! TR = max(high - low, |high - prev_close|, |low - prev_close|)
//! ATR(n) = mean of the last n true ranges.

use crate::domain::candle::Candle;

/// ATR over the trailing `period` candles of `candles`.
///
/// The previous close for the oldest window candle comes from the candle
/// before the window when one exists; otherwise that candle's TR degrades
/// to high - low. Returns 0 when fewer than `period` candles are available.
pub fn average_true_range(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period {
        return 0.0;
    }

    let start = candles.len() - period;
    let mut sum = 0.0;
    for i in start..candles.len() {
        let c = &candles[i];
        let tr = if i == 0 {
            c.high - c.low
        } else {
            c.true_range(candles[i - 1].close)
        };
        sum += tr;
    }
    sum / period as f64
}
