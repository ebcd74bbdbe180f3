//! OHLC candle representation.

/// One OHLC bar over a fixed interval, stamped with its open time in
/// Unix epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub epoch: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// A candle is usable when every price is finite and the epoch is set.
    pub fn is_valid(&self) -> bool {
        self.epoch > 0
            && self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

/// Per-row higher-timeframe reference closes.
///
/// Buckets the input by `epoch / (granularity * factor)` and assigns every
/// row the final close of its own bucket, so each base row sees the fully
/// aggregated higher-timeframe value. This mirrors the resample-then-ffill
/// alignment of the data pipeline this engine replays, including its
/// intra-bucket lookahead.
pub fn resample_closes(candles: &[Candle], granularity: i64, factor: i64) -> Vec<f64> {
    let bucket_span = granularity * factor;
    if bucket_span <= 0 || candles.is_empty() {
        return vec![f64::NAN; candles.len()];
    }

    let mut out = vec![f64::NAN; candles.len()];
    let mut start = 0;
    while start < candles.len() {
        let bucket = candles[start].epoch.div_euclid(bucket_span);
        let mut end = start + 1;
        while end < candles.len() && candles[end].epoch.div_euclid(bucket_span) == bucket {
            end += 1;
        }
        let bucket_close = candles[end - 1].close;
        for slot in &mut out[start..end] {
            *slot = bucket_close;
        }
        start = end;
    }
    out
}
