#![allow(dead_code)]

use std::collections::BTreeMap;
use std::f64::consts::PI;

use cycletrader::domain::candle::Candle;
use cycletrader::domain::ledger::Position;
use cycletrader::domain::settings::{BacktestSettings, LiveSettings};
use cycletrader::domain::signal::{SignalKind, TradeSignal};
use cycletrader::domain::strategy::Strategy;

/// Plays back a fixed signal sequence, one per processed candle, then
/// holds forever. `reset` rewinds the script.
pub struct ScriptedStrategy {
    signals: Vec<TradeSignal>,
    cursor: usize,
    position: Option<Position>,
}

impl ScriptedStrategy {
    pub fn new(signals: Vec<TradeSignal>) -> Self {
        Self {
            signals,
            cursor: 0,
            position: None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn required_lookback(&self) -> usize {
        0
    }

    fn update(&mut self, _candle: &Candle, _htf_close: Option<f64>) {}

    fn signal(&mut self) -> TradeSignal {
        let signal = self
            .signals
            .get(self.cursor)
            .cloned()
            .unwrap_or_else(TradeSignal::hold);
        self.cursor += 1;
        signal
    }

    fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.position = None;
    }
}

pub fn buy(stop_loss: f64, take_profit: f64) -> TradeSignal {
    TradeSignal::entry(SignalKind::Buy, 0.8, stop_loss, take_profit, BTreeMap::new())
}

pub fn sell(stop_loss: f64, take_profit: f64) -> TradeSignal {
    TradeSignal::entry(SignalKind::Sell, 0.8, stop_loss, take_profit, BTreeMap::new())
}

pub fn hold() -> TradeSignal {
    TradeSignal::hold()
}

pub fn close() -> TradeSignal {
    TradeSignal::close()
}

/// Candle with a 1.0 high-low band around the close.
pub fn candle(epoch: i64, close: f64) -> Candle {
    Candle {
        epoch,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
    }
}

/// Candle with a 10.0 high-low band around the close. The wide band keeps
/// ATR large relative to any trend drift, so regime filters read the
/// series as range-bound.
pub fn wide_candle(epoch: i64, close: f64) -> Candle {
    Candle {
        epoch,
        open: close,
        high: close + 5.0,
        low: close - 5.0,
        close,
    }
}

/// One candle per close, epochs starting at `granularity` and stepping by
/// `granularity`.
pub fn candles_from_closes(closes: &[f64], granularity: i64) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| candle((i as i64 + 1) * granularity, close))
        .collect()
}

pub fn flat_closes(count: usize, price: f64) -> Vec<f64> {
    vec![price; count]
}

pub fn trend_closes(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// `tiles` repetitions of a `samples`-long half-cosine arc from
/// `base + amplitude` down to `base - amplitude`. Tiling the arc yields a
/// series whose dominant period is `samples`.
pub fn cycle_closes(tiles: usize, samples: usize, base: f64, amplitude: f64) -> Vec<f64> {
    let arc: Vec<f64> = (0..samples)
        .map(|i| base + amplitude * (PI * i as f64 / (samples - 1) as f64).cos())
        .collect();
    let mut closes = Vec::with_capacity(tiles * samples);
    for _ in 0..tiles {
        closes.extend_from_slice(&arc);
    }
    closes
}

pub fn sample_settings() -> BacktestSettings {
    BacktestSettings {
        symbol: "R_100".to_string(),
        granularity: 60,
        initial_balance: 1000.0,
        stake: 30.0,
    }
}

pub fn sample_live_settings(demo: bool) -> LiveSettings {
    LiveSettings {
        symbol: "R_100".to_string(),
        stake: 30.0,
        min_quote_interval: 0.0,
        demo,
        duration: 5,
        duration_unit: "t".to_string(),
    }
}
