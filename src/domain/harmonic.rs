//! Harmonic forecast strategy.
//!
//! Smooths closes with a linear-weighted moving average, detects the
//! dominant cycle from the distance between the series extremes, and
//! projects the cycle forward:
//!
//!   predicted = midpoint + amplitude * cos(2*pi*frequency*horizon + phase)
//!
//! Entries fire when price deviates from the projection in a ranging
//! market; the position closes when price crosses back over the
//! projection.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::domain::candle::Candle;
use crate::domain::indicator::{average_true_range, linear_weighted_mean, simple_mean};
use crate::domain::ledger::Position;
use crate::domain::series::BoundedSeries;
use crate::domain::settings::HarmonicParams;
use crate::domain::signal::{Side, SignalKind, TradeSignal};
use crate::domain::strategy::Strategy;

/// One harmonic projection of the smoothed series.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HarmonicForecast {
    pub predicted_price: f64,
    pub dominant_period: usize,
    pub amplitude: f64,
}

/// Distance in samples between the last occurrence of the series maximum
/// and the last occurrence of its minimum. Degenerate distances (0 or 1)
/// fall back to half the series length, as does a series shorter than 2.
pub(crate) fn dominant_period(smoothed: &BoundedSeries<f64>) -> usize {
    if smoothed.len() < 2 {
        return smoothed.len() / 2;
    }
    let (Some((max_idx, _)), Some((min_idx, _))) = (smoothed.argmax_last(), smoothed.argmin_last())
    else {
        return smoothed.len() / 2;
    };
    let period = max_idx.abs_diff(min_idx);
    if period > 1 { period } else { smoothed.len() / 2 }
}

/// Projects the smoothed series `horizon` samples ahead. `None` on an
/// empty series.
pub(crate) fn forecast_price(
    smoothed: &BoundedSeries<f64>,
    horizon: usize,
) -> Option<HarmonicForecast> {
    let (_, max) = smoothed.argmax_last()?;
    let (_, min) = smoothed.argmin_last()?;
    let last = *smoothed.last()?;

    let period = dominant_period(smoothed);
    let amplitude = (max - min) / 2.0;
    let midpoint = (max + min) / 2.0;
    let phase_offset = if amplitude == 0.0 {
        0.0
    } else {
        (last - midpoint).atan2(amplitude)
    };
    let frequency = if period > 0 { 1.0 / period as f64 } else { 0.0 };
    let predicted_price =
        midpoint + amplitude * (2.0 * PI * frequency * horizon as f64 + phase_offset).cos();

    Some(HarmonicForecast {
        predicted_price,
        dominant_period: period,
        amplitude,
    })
}

pub struct HarmonicStrategy {
    params: HarmonicParams,
    candles: BoundedSeries<Candle>,
    smoothed: BoundedSeries<f64>,
    atr: f64,
    trend_strength: f64,
    is_ranging: bool,
    forecast: Option<HarmonicForecast>,
    mtf_reference: Option<f64>,
    position: Option<Position>,
}

impl HarmonicStrategy {
    pub fn new(params: HarmonicParams) -> Self {
        let buffer_capacity = params.required_lookback() + 50;
        let smoothed_capacity = params.lookback;
        Self {
            params,
            candles: BoundedSeries::new(buffer_capacity),
            smoothed: BoundedSeries::new(smoothed_capacity),
            atr: 0.0,
            trend_strength: 0.0,
            is_ranging: false,
            forecast: None,
            mtf_reference: None,
            position: None,
        }
    }

    fn recompute_indicators(&mut self) {
        let candles: Vec<Candle> = self.candles.iter().copied().collect();
        self.atr = average_true_range(&candles, self.params.atr_period);

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let sma_20 = simple_mean(&closes[closes.len().saturating_sub(20)..]);
        let sma_50 = if closes.len() >= 50 {
            simple_mean(&closes[closes.len() - 50..])
        } else {
            sma_20
        };
        self.trend_strength = (sma_20 - sma_50).abs();
        self.is_ranging = self.trend_strength < self.atr * 2.0;

        if self.smoothed.len() >= self.params.lookback {
            self.forecast = forecast_price(&self.smoothed, self.params.forecast);
        }
    }

    fn entry_metadata(&self, current: f64) -> BTreeMap<String, f64> {
        let mut metadata = BTreeMap::new();
        if let Some(forecast) = &self.forecast {
            metadata.insert("predicted_price".to_string(), forecast.predicted_price);
            metadata.insert("period".to_string(), forecast.dominant_period as f64);
            metadata.insert("amplitude".to_string(), forecast.amplitude);
        }
        metadata.insert("current_price".to_string(), current);
        metadata.insert("atr".to_string(), self.atr);
        metadata.insert("mtf_confirmed".to_string(), 1.0);
        metadata
    }
}

impl Strategy for HarmonicStrategy {
    fn name(&self) -> &str {
        "harmonic"
    }

    fn required_lookback(&self) -> usize {
        self.params.required_lookback()
    }

    fn update(&mut self, candle: &Candle, htf_close: Option<f64>) {
        self.candles.push(*candle);
        if let Some(reference) = htf_close {
            self.mtf_reference = Some(reference);
        }

        if self.candles.len() >= self.params.smooth_period {
            let window: Vec<f64> = self
                .candles
                .tail(self.params.smooth_period)
                .map(|c| c.close)
                .collect();
            self.smoothed.push(linear_weighted_mean(&window));
        }

        if self.candles.len() >= self.params.required_lookback() {
            self.recompute_indicators();
        }
    }

    fn signal(&mut self) -> TradeSignal {
        if self.candles.len() < self.params.required_lookback() {
            return TradeSignal::hold();
        }
        let Some(forecast) = self.forecast else {
            return TradeSignal::hold();
        };
        let current = match self.candles.last() {
            Some(candle) => candle.close,
            None => return TradeSignal::hold(),
        };
        let predicted = forecast.predicted_price;

        // Trade the projection only in range-bound regimes, and only when
        // price has pulled far enough away from it.
        let deviation = (current - predicted).abs();
        let min_deviation = self.atr * self.params.atr_multiplier;
        if !self.is_ranging || deviation < min_deviation {
            return TradeSignal::hold();
        }

        // Cycle complete: price crossing back over the projection closes
        // the position. Stops and targets are risk limits, not exits.
        if let Some(position) = &self.position {
            return match position.side {
                Side::Long if current > predicted => TradeSignal::close(),
                Side::Short if current < predicted => TradeSignal::close(),
                _ => TradeSignal::hold(),
            };
        }

        if current < predicted {
            if self.params.mtf_enabled {
                if let Some(reference) = self.mtf_reference {
                    if current >= reference {
                        return TradeSignal::hold();
                    }
                }
            }
            let risk_move = self.params.risk_cash / self.params.stake.max(1e-9) * current;
            let strength = (deviation / (self.atr * 2.0)).min(1.0);
            return TradeSignal::entry(
                SignalKind::Buy,
                strength,
                current - risk_move,
                current + risk_move * self.params.rr_ratio,
                self.entry_metadata(current),
            );
        }

        if current > predicted {
            if self.params.mtf_enabled {
                if let Some(reference) = self.mtf_reference {
                    if current <= reference {
                        return TradeSignal::hold();
                    }
                }
            }
            let risk_move = self.params.risk_cash / self.params.stake.max(1e-9) * current;
            let strength = (deviation / (self.atr * 2.0)).min(1.0);
            return TradeSignal::entry(
                SignalKind::Sell,
                strength,
                current + risk_move,
                current - risk_move * self.params.rr_ratio,
                self.entry_metadata(current),
            );
        }

        TradeSignal::hold()
    }

    fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    fn reset(&mut self) {
        self.candles.clear();
        self.smoothed.clear();
        self.atr = 0.0;
        self.trend_strength = 0.0;
        self.is_ranging = false;
        self.forecast = None;
        self.mtf_reference = None;
        self.position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_params() -> HarmonicParams {
        HarmonicParams {
            lookback: 4,
            forecast: 1,
            smooth_period: 1,
            stake: 30.0,
            risk_cash: 3.0,
            rr_ratio: 3.0,
            atr_period: 2,
            atr_multiplier: 0.1,
            mtf_enabled: false,
        }
    }

    fn candle_at(i: usize, close: f64) -> Candle {
        Candle {
            epoch: (i as i64 + 1) * 60,
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
        }
    }

    fn feed(strategy: &mut HarmonicStrategy, closes: &[f64]) {
        for (i, &close) in closes.iter().enumerate() {
            strategy.update(&candle_at(i, close), None);
        }
    }

    // 24 candles: flat warmup, then a swing leaving the last close above
    // the harmonic projection.
    fn sell_setup_closes() -> Vec<f64> {
        let mut closes = vec![100.0; 20];
        closes.extend([105.0, 95.0, 100.0, 97.0]);
        closes
    }

    // As above but the last close lands well below the projection.
    fn buy_setup_closes() -> Vec<f64> {
        let mut closes = vec![100.0; 20];
        closes.extend([105.0, 95.0, 100.0, 95.5]);
        closes
    }

    #[test]
    fn holds_before_required_lookback() {
        let mut strategy = HarmonicStrategy::new(make_params());
        let required = strategy.required_lookback();
        for i in 0..required - 1 {
            strategy.update(&candle_at(i, 100.0), None);
            let signal = strategy.signal();
            assert_eq!(signal.kind, SignalKind::Hold);
            assert_eq!(signal.strength, 0.0);
        }
    }

    #[test]
    fn flat_market_never_signals() {
        let mut strategy = HarmonicStrategy::new(HarmonicParams::default());
        for i in 0..200 {
            strategy.update(&candle_at(i, 100.0), None);
            assert_eq!(strategy.signal().kind, SignalKind::Hold);
        }
    }

    #[test]
    fn dominant_period_spans_cycle_extremes() {
        // One 20-sample cycle with its peak at the start and trough at the
        // end, tiled so every cycle repeats bit-identically.
        let cycle: Vec<f64> = (0..20)
            .map(|i| 100.0 + 10.0 * (PI * i as f64 / 19.0).cos())
            .collect();
        let mut series = BoundedSeries::new(100);
        for _ in 0..5 {
            for &value in &cycle {
                series.push(value);
            }
        }
        let period = dominant_period(&series);
        assert!(
            (18..=22).contains(&period),
            "period {period} outside tolerance"
        );
    }

    #[test]
    fn dominant_period_falls_back_to_half_length() {
        let mut single = BoundedSeries::new(10);
        single.push(1.0);
        assert_eq!(dominant_period(&single), 0);

        // All values tie, so max and min land on the same index.
        let mut flat = BoundedSeries::new(10);
        for _ in 0..6 {
            flat.push(7.0);
        }
        assert_eq!(dominant_period(&flat), 3);
    }

    #[test]
    fn forecast_on_flat_series_collapses_to_price() {
        let mut series = BoundedSeries::new(50);
        for _ in 0..50 {
            series.push(100.0);
        }
        let forecast = forecast_price(&series, 20).unwrap();
        assert_eq!(forecast.predicted_price, 100.0);
        assert_eq!(forecast.amplitude, 0.0);

        assert!(forecast_price(&BoundedSeries::new(5), 20).is_none());
    }

    #[test]
    fn sell_entry_when_price_above_forecast() {
        let mut strategy = HarmonicStrategy::new(make_params());
        feed(&mut strategy, &sell_setup_closes());

        // Smoothed window [105, 95, 100, 97]: extremes 1 apart, so the
        // period falls back to 2 and the projection lands one half-cycle
        // away: 100 - 5*cos(atan(3/5)).
        let predicted = 100.0 - 5.0 * 0.6f64.atan().cos();
        let signal = strategy.signal();
        assert_eq!(signal.kind, SignalKind::Sell);
        assert_relative_eq!(signal.metadata["predicted_price"], predicted, epsilon = 1e-9);
        assert_relative_eq!(signal.strength, (97.0 - predicted) / 9.0, epsilon = 1e-9);
        assert_relative_eq!(signal.stop_loss.unwrap(), 106.7, epsilon = 1e-9);
        assert_relative_eq!(signal.take_profit.unwrap(), 67.9, epsilon = 1e-9);
        assert_eq!(signal.metadata["period"], 2.0);
        assert_relative_eq!(signal.metadata["atr"], 4.5, epsilon = 1e-9);
        assert_eq!(signal.metadata["mtf_confirmed"], 1.0);
    }

    #[test]
    fn buy_entry_when_price_below_forecast() {
        let mut strategy = HarmonicStrategy::new(make_params());
        feed(&mut strategy, &buy_setup_closes());

        let predicted = 100.0 - 5.0 * 0.9f64.atan().cos();
        let signal = strategy.signal();
        assert_eq!(signal.kind, SignalKind::Buy);
        assert!(95.5 < predicted);
        assert_relative_eq!(signal.strength, (predicted - 95.5) / 10.5, epsilon = 1e-9);
        assert_relative_eq!(signal.stop_loss.unwrap(), 85.95, epsilon = 1e-9);
        assert_relative_eq!(signal.take_profit.unwrap(), 124.15, epsilon = 1e-9);
    }

    #[test]
    fn close_fires_when_price_crosses_forecast() {
        let mut strategy = HarmonicStrategy::new(make_params());
        feed(&mut strategy, &sell_setup_closes());
        assert_eq!(strategy.signal().kind, SignalKind::Sell);

        strategy.set_position(Some(Position {
            side: Side::Short,
            entry_price: 97.0,
            entry_time: 24 * 60,
            stake: 30.0,
            stop_loss: None,
            take_profit: None,
        }));

        // Price collapses below the refreshed projection: cycle complete.
        strategy.update(&candle_at(24, 90.0), None);
        let signal = strategy.signal();
        assert_eq!(signal.kind, SignalKind::Close);
        assert_eq!(signal.strength, 1.0);
    }

    #[test]
    fn open_long_holds_until_upward_cross() {
        let mut strategy = HarmonicStrategy::new(make_params());
        feed(&mut strategy, &sell_setup_closes());
        strategy.set_position(Some(Position {
            side: Side::Long,
            entry_price: 97.0,
            entry_time: 24 * 60,
            stake: 30.0,
            stop_loss: None,
            take_profit: None,
        }));

        // Same candle that closes a short; a long stays open below the
        // projection.
        strategy.update(&candle_at(24, 90.0), None);
        assert_eq!(strategy.signal().kind, SignalKind::Hold);
    }

    #[test]
    fn mtf_reference_gates_long_entry() {
        let blocked_params = HarmonicParams {
            mtf_enabled: true,
            ..make_params()
        };
        let closes = buy_setup_closes();
        let (last, rest) = closes.split_last().unwrap();

        let mut blocked = HarmonicStrategy::new(blocked_params.clone());
        feed(&mut blocked, rest);
        blocked.update(&candle_at(rest.len(), *last), Some(90.0));
        assert_eq!(blocked.signal().kind, SignalKind::Hold);

        let mut confirmed = HarmonicStrategy::new(blocked_params);
        feed(&mut confirmed, rest);
        confirmed.update(&candle_at(rest.len(), *last), Some(200.0));
        assert_eq!(confirmed.signal().kind, SignalKind::Buy);
    }

    #[test]
    fn reset_then_replay_is_deterministic() {
        let mut strategy = HarmonicStrategy::new(make_params());
        let closes = sell_setup_closes();
        feed(&mut strategy, &closes);
        let first = strategy.signal();

        strategy.reset();
        assert_eq!(strategy.signal().kind, SignalKind::Hold);

        feed(&mut strategy, &closes);
        assert_eq!(strategy.signal(), first);
    }
}
