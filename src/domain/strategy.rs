//! Strategy capability interface.
//!
//! Concrete strategies are independent types behind one trait; the backtest
//! runner and the live engine drive them identically.

use crate::domain::candle::Candle;
use crate::domain::ledger::Position;
use crate::domain::signal::TradeSignal;

pub trait Strategy {
    /// Display name for logs and reports.
    fn name(&self) -> &str;

    /// Minimum number of candles before non-HOLD output is possible.
    fn required_lookback(&self) -> usize;

    /// Feeds one candle into the rolling state. `htf_close` carries the
    /// higher-timeframe reference close aligned with this candle, when the
    /// caller tracks one.
    fn update(&mut self, candle: &Candle, htf_close: Option<f64>);

    /// Evaluates the current state into a signal. Takes `&mut self` for
    /// trailing-stop bookkeeping only; never opens or closes positions.
    fn signal(&mut self) -> TradeSignal;

    /// Informs the strategy of the ledger's open position, if any, so exit
    /// logic can reference entry price and side.
    fn set_position(&mut self, position: Option<Position>);

    /// Clears buffers, indicators, position reference, and trailing state.
    fn reset(&mut self);
}
