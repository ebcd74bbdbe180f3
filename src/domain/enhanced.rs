//! Enhanced harmonic strategy.
//!
//! Same cycle projection as the base strategy, with entry filters and risk
//! handling layered on top: dynamic stake sizing from signal strength, a
//! trailing stop on unrealized profit, a volatility-expansion boost, and a
//! momentum filter.

use std::collections::BTreeMap;

use log::info;

use crate::domain::candle::Candle;
use crate::domain::harmonic::{HarmonicForecast, forecast_price};
use crate::domain::indicator::{
    average_true_range, linear_weighted_mean, rate_of_change, simple_mean,
};
use crate::domain::ledger::Position;
use crate::domain::series::BoundedSeries;
use crate::domain::settings::EnhancedParams;
use crate::domain::signal::{Side, SignalKind, TradeSignal};
use crate::domain::strategy::Strategy;

const ATR_HISTORY_CAPACITY: usize = 20;

pub struct EnhancedStrategy {
    params: EnhancedParams,
    candles: BoundedSeries<Candle>,
    smoothed: BoundedSeries<f64>,
    atr: f64,
    atr_history: BoundedSeries<f64>,
    vol_expanding: bool,
    momentum: f64,
    trend_strength: f64,
    is_ranging: bool,
    forecast: Option<HarmonicForecast>,
    mtf_reference: Option<f64>,
    position: Option<Position>,
    /// Running peak of unrealized profit, in price terms, for the
    /// trailing stop. Reset on every entry and close.
    highest_profit: f64,
}

impl EnhancedStrategy {
    pub fn new(params: EnhancedParams) -> Self {
        let buffer_capacity = params.required_lookback() + 50;
        let smoothed_capacity = params.lookback;
        Self {
            params,
            candles: BoundedSeries::new(buffer_capacity),
            smoothed: BoundedSeries::new(smoothed_capacity),
            atr: 0.0,
            atr_history: BoundedSeries::new(ATR_HISTORY_CAPACITY),
            vol_expanding: false,
            momentum: 0.0,
            trend_strength: 0.0,
            is_ranging: false,
            forecast: None,
            mtf_reference: None,
            position: None,
            highest_profit: 0.0,
        }
    }

    fn recompute_indicators(&mut self) {
        let candles: Vec<Candle> = self.candles.iter().copied().collect();
        let atr = average_true_range(&candles, self.params.atr_period);
        self.atr = atr;
        self.atr_history.push(atr);

        // Volatility regime: mean of the last 5 ATR readings against the
        // 5 before them.
        if self.atr_history.len() >= 10 {
            let history: Vec<f64> = self.atr_history.iter().copied().collect();
            let split = history.len() - 5;
            let recent = simple_mean(&history[split..]);
            let older = simple_mean(&history[history.len() - 10..split]);
            let ratio = if older > 0.0 { recent / older } else { 1.0 };
            self.vol_expanding = ratio > self.params.vol_expansion;
        } else {
            self.vol_expanding = false;
        }

        if self.params.use_momentum_filter && candles.len() >= self.params.momentum_period {
            let window: Vec<f64> = candles[candles.len() - self.params.momentum_period..]
                .iter()
                .map(|c| c.close)
                .collect();
            self.momentum = rate_of_change(&window);
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let sma_20 = simple_mean(&closes[closes.len().saturating_sub(20)..]);
        let sma_50 = if closes.len() >= 50 {
            simple_mean(&closes[closes.len() - 50..])
        } else {
            sma_20
        };
        self.trend_strength = (sma_20 - sma_50).abs();
        self.is_ranging = self.trend_strength < atr * 2.0;

        if self.smoothed.len() >= self.params.lookback {
            self.forecast = forecast_price(&self.smoothed, self.params.forecast);
        }
    }

    /// Signal strength in [0, 1]: deviation from the projection, boosted
    /// 1.3x when volatility is expanding and 1.2x when momentum points
    /// into the entry.
    fn signal_strength(&self, current: f64, predicted: f64) -> f64 {
        if self.atr == 0.0 {
            return 0.0;
        }
        let deviation = (current - predicted).abs();
        let base = (deviation / (self.atr * 2.0)).min(1.0);
        let vol_multiplier = if self.vol_expanding { 1.3 } else { 1.0 };
        let mut momentum_multiplier = 1.0;
        if self.params.use_momentum_filter {
            // Longs want an oversold tape, shorts an overbought one.
            if current < predicted && self.momentum < -0.5 {
                momentum_multiplier = 1.2;
            } else if current > predicted && self.momentum > 0.5 {
                momentum_multiplier = 1.2;
            }
        }
        (base * vol_multiplier * momentum_multiplier).min(1.0)
    }

    /// Stake scaled linearly from 1x at strength 0.5 up to
    /// `max_stake_multiplier` at strength 1.0.
    fn dynamic_stake(&self, strength: f64) -> f64 {
        if strength < 0.5 {
            return self.params.stake;
        }
        let multiplier = (1.0 + (strength - 0.5) * 2.0 * (self.params.max_stake_multiplier - 1.0))
            .min(self.params.max_stake_multiplier);
        self.params.stake * multiplier
    }

    fn entry_metadata(&self, stake: f64, strength: f64) -> BTreeMap<String, f64> {
        let mut metadata = BTreeMap::new();
        if let Some(forecast) = &self.forecast {
            metadata.insert("predicted_price".to_string(), forecast.predicted_price);
        }
        metadata.insert("stake".to_string(), stake);
        metadata.insert("signal_strength".to_string(), strength);
        metadata.insert("atr".to_string(), self.atr);
        metadata.insert(
            "vol_expanding".to_string(),
            if self.vol_expanding { 1.0 } else { 0.0 },
        );
        metadata.insert("momentum".to_string(), self.momentum);
        metadata
    }
}

impl Strategy for EnhancedStrategy {
    fn name(&self) -> &str {
        "enhanced"
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

        let strength = self.signal_strength(current, predicted);
        let deviation = (current - predicted).abs();
        if !self.is_ranging || deviation < self.atr * self.params.min_atr_multiplier {
            return TradeSignal::hold();
        }

        if let Some(position) = self.position {
            let current_pnl = position.price_pnl(current);
            if current_pnl > self.highest_profit {
                self.highest_profit = current_pnl;
            }

            if self.params.use_trailing_stop {
                let risk_move = self.params.risk_factor * self.params.stake
                    / self.params.stake.max(1e-9)
                    * position.entry_price;
                let activation_profit = risk_move * self.params.trail_activation;
                if self.highest_profit > activation_profit {
                    let trail_distance = risk_move * self.params.trail_distance;
                    if current_pnl < self.highest_profit - trail_distance {
                        info!(
                            "Trailing stop hit: profit fell from ${:.2} to ${:.2}",
                            self.highest_profit, current_pnl
                        );
                        self.highest_profit = 0.0;
                        return TradeSignal::close();
                    }
                }
            }

            match position.side {
                Side::Long if current > predicted => {
                    self.highest_profit = 0.0;
                    return TradeSignal::close();
                }
                Side::Short if current < predicted => {
                    self.highest_profit = 0.0;
                    return TradeSignal::close();
                }
                _ => {}
            }
            return TradeSignal::hold();
        }

        let stake = self.dynamic_stake(strength);
        let risk_cash = stake * self.params.risk_factor;

        if current < predicted {
            if self.params.mtf_enabled {
                if let Some(reference) = self.mtf_reference {
                    if current >= reference {
                        return TradeSignal::hold();
                    }
                }
            }
            if self.params.use_momentum_filter && self.momentum > 1.0 {
                return TradeSignal::hold();
            }
            let risk_move = risk_cash / stake.max(1e-9) * current;
            self.highest_profit = 0.0;
            return TradeSignal::entry(
                SignalKind::Buy,
                strength,
                current - risk_move,
                current + risk_move * self.params.rr_ratio,
                self.entry_metadata(stake, strength),
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
            if self.params.use_momentum_filter && self.momentum < -1.0 {
                return TradeSignal::hold();
            }
            let risk_move = risk_cash / stake.max(1e-9) * current;
            self.highest_profit = 0.0;
            return TradeSignal::entry(
                SignalKind::Sell,
                strength,
                current + risk_move,
                current - risk_move * self.params.rr_ratio,
                self.entry_metadata(stake, strength),
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
        self.atr_history.clear();
        self.vol_expanding = false;
        self.momentum = 0.0;
        self.trend_strength = 0.0;
        self.is_ranging = false;
        self.forecast = None;
        self.mtf_reference = None;
        self.position = None;
        self.highest_profit = 0.0;
    }
}
