//! Position and trade bookkeeping shared by the backtester and the live
//! engine. At most one position is open at a time; closing a position
//! produces a completed `Trade` record.

use crate::domain::signal::Side;

/// An open position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    /// Entry candle epoch, seconds.
    pub entry_time: i64,
    pub stake: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Position {
    /// Unrealized move in price terms, signed from the position's side.
    pub fn price_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => price - self.entry_price,
            Side::Short => self.entry_price - price,
        }
    }
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub side: Side,
    pub entry_time: i64,
    pub entry_price: f64,
    pub stake: f64,
    pub exit_time: i64,
    pub exit_price: f64,
    pub exit_reason: String,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub duration_seconds: i64,
}

/// Tracks the single open position, completed trades, and the realized
/// equity curve of a run.
#[derive(Debug)]
pub struct PositionLedger {
    initial_balance: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    equity_curve: Vec<f64>,
}

impl PositionLedger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            position: None,
            trades: Vec::new(),
            equity_curve: vec![initial_balance],
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// Sum of realized PnL over all completed trades.
    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    /// Opens a position. Returns `None` if one is already open.
    pub fn open(
        &mut self,
        side: Side,
        entry_price: f64,
        entry_time: i64,
        stake: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Option<Position> {
        if self.position.is_some() {
            return None;
        }
        let position = Position {
            side,
            entry_price,
            entry_time,
            stake,
            stop_loss,
            take_profit,
        };
        self.position = Some(position);
        Some(position)
    }

    /// Closes the open position at `exit_price`, recording the completed
    /// trade. Returns `None` if no position is open.
    ///
    /// PnL is settled in cash against the notional quantity
    /// `stake / entry_price`, so a long that gains x% realizes
    /// `stake * x / 100`.
    pub fn close(&mut self, exit_price: f64, exit_time: i64, reason: &str) -> Option<Trade> {
        let position = self.position.take()?;
        let quantity = position.stake / position.entry_price;
        let price_move = position.price_pnl(exit_price);
        let trade = Trade {
            side: position.side,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            stake: position.stake,
            exit_time,
            exit_price,
            exit_reason: reason.to_string(),
            pnl: price_move * quantity,
            pnl_pct: price_move / position.entry_price * 100.0,
            duration_seconds: exit_time - position.entry_time,
        };
        self.trades.push(trade.clone());
        Some(trade)
    }

    /// Appends one point to the equity curve: initial balance plus realized
    /// PnL. Called once per processed candle.
    pub fn record_equity(&mut self) {
        self.equity_curve.push(self.initial_balance + self.realized_pnl());
    }
}
