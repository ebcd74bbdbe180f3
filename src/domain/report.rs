//! Performance aggregation over a completed run.

use std::fmt;

use crate::domain::ledger::Trade;

/// Summary statistics for one run. Monetary fields are in account
/// currency; `win_rate` and `max_drawdown` are percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub strategy: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl_per_trade: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration_secs: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub final_balance: f64,
}

impl PerformanceReport {
    pub fn compute(
        strategy: &str,
        trades: &[Trade],
        equity_curve: &[f64],
        initial_balance: f64,
    ) -> Self {
        let total_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.pnl > 0.0).count();
        // Break-even trades count against the win rate.
        let losing_trades = total_trades - winning_trades;
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let avg_pnl_per_trade = if total_trades > 0 {
            total_pnl / total_trades as f64
        } else {
            0.0
        };

        let max_profit = trades.iter().map(|t| t.pnl).fold(f64::MIN, f64::max);
        let max_profit = if total_trades > 0 { max_profit } else { 0.0 };
        let max_loss = trades.iter().map(|t| t.pnl).fold(f64::MAX, f64::min);
        let max_loss = if total_trades > 0 { max_loss } else { 0.0 };

        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        for trade in trades {
            if trade.pnl > 0.0 {
                gross_profit += trade.pnl;
                largest_win = largest_win.max(trade.pnl);
            } else if trade.pnl < 0.0 {
                gross_loss += trade.pnl.abs();
                largest_loss = largest_loss.min(trade.pnl);
            }
        }

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        // Zero-duration round trips are excluded from the average.
        let durations: Vec<i64> = trades
            .iter()
            .map(|t| t.duration_seconds)
            .filter(|&d| d != 0)
            .collect();
        let avg_trade_duration_secs = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<i64>() as f64 / durations.len() as f64
        };

        Self {
            strategy: strategy.to_string(),
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_pnl,
            avg_pnl_per_trade,
            max_profit,
            max_loss,
            largest_win,
            largest_loss,
            avg_trade_duration_secs,
            max_drawdown: max_drawdown(equity_curve),
            profit_factor,
            final_balance: initial_balance + total_pnl,
        }
    }
}

/// Maximum peak-to-trough decline over the equity curve, in percent.
/// The peak is the running maximum; the drawdown only moves while equity
/// sits below it.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        }
        let drawdown = if peak > 0.0 {
            (peak - equity) / peak * 100.0
        } else {
            0.0
        };
        if drawdown > max_dd {
            max_dd = drawdown;
        }
    }
    max_dd
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "Backtest Complete: {}", self.strategy)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total Trades: {}", self.total_trades)?;
        writeln!(
            f,
            "Winners: {} | Losers: {}",
            self.winning_trades, self.losing_trades
        )?;
        writeln!(f, "Win Rate: {:.2}%", self.win_rate)?;
        writeln!(f, "Total PnL: ${:.2}", self.total_pnl)?;
        writeln!(f, "Avg PnL/Trade: ${:.2}", self.avg_pnl_per_trade)?;
        writeln!(f, "Max Profit: ${:.2}", self.max_profit)?;
        writeln!(f, "Max Loss: ${:.2}", self.max_loss)?;
        writeln!(f, "Largest Win: ${:.2}", self.largest_win)?;
        writeln!(f, "Largest Loss: ${:.2}", self.largest_loss)?;
        writeln!(f, "Profit Factor: {:.2}", self.profit_factor)?;
        writeln!(f, "Max Drawdown: {:.2}%", self.max_drawdown)?;
        writeln!(
            f,
            "Avg Trade Duration: {:.2} min",
            self.avg_trade_duration_secs / 60.0
        )?;
        writeln!(f, "Final Balance: ${:.2}", self.final_balance)?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Side;
    use approx::assert_relative_eq;

    fn make_trade(pnl: f64, duration_seconds: i64) -> Trade {
        Trade {
            side: Side::Long,
            entry_time: 0,
            entry_price: 100.0,
            stake: 30.0,
            exit_time: duration_seconds,
            exit_price: 100.0 + pnl,
            exit_reason: "Signal".to_string(),
            pnl,
            pnl_pct: pnl,
            duration_seconds,
        }
    }

    #[test]
    fn empty_run_reports_zeros() {
        let report = PerformanceReport::compute("harmonic", &[], &[1000.0], 1000.0);
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.win_rate, 0.0);
        assert_eq!(report.total_pnl, 0.0);
        assert_eq!(report.max_profit, 0.0);
        assert_eq!(report.max_loss, 0.0);
        assert_eq!(report.profit_factor, 0.0);
        assert_eq!(report.max_drawdown, 0.0);
        assert_eq!(report.final_balance, 1000.0);
    }

    #[test]
    fn mixed_trades_aggregate() {
        let trades = vec![
            make_trade(4.0, 600),
            make_trade(-2.0, 1200),
            make_trade(1.0, 300),
            make_trade(-0.5, 900),
        ];
        let report = PerformanceReport::compute("harmonic", &trades, &[1000.0], 1000.0);

        assert_eq!(report.total_trades, 4);
        assert_eq!(report.winning_trades, 2);
        assert_eq!(report.losing_trades, 2);
        assert_relative_eq!(report.win_rate, 50.0);
        assert_relative_eq!(report.total_pnl, 2.5);
        assert_relative_eq!(report.avg_pnl_per_trade, 0.625);
        assert_relative_eq!(report.max_profit, 4.0);
        assert_relative_eq!(report.max_loss, -2.0);
        assert_relative_eq!(report.largest_win, 4.0);
        assert_relative_eq!(report.largest_loss, -2.0);
        assert_relative_eq!(report.profit_factor, 2.0);
        assert_relative_eq!(report.avg_trade_duration_secs, 750.0);
        assert_relative_eq!(report.final_balance, 1002.5);
    }

    #[test]
    fn break_even_counts_as_loss() {
        let trades = vec![make_trade(1.0, 60), make_trade(0.0, 60)];
        let report = PerformanceReport::compute("harmonic", &trades, &[1000.0], 1000.0);
        assert_eq!(report.winning_trades, 1);
        assert_eq!(report.losing_trades, 1);
        assert_relative_eq!(report.win_rate, 50.0);
    }

    #[test]
    fn profit_factor_edges() {
        let wins_only = vec![make_trade(2.0, 60)];
        let report = PerformanceReport::compute("harmonic", &wins_only, &[1000.0], 1000.0);
        assert!(report.profit_factor.is_infinite());

        let break_even_only = vec![make_trade(0.0, 60)];
        let report = PerformanceReport::compute("harmonic", &break_even_only, &[1000.0], 1000.0);
        assert_eq!(report.profit_factor, 0.0);
    }

    #[test]
    fn zero_duration_trades_excluded_from_average() {
        let trades = vec![make_trade(1.0, 0), make_trade(1.0, 600)];
        let report = PerformanceReport::compute("harmonic", &trades, &[1000.0], 1000.0);
        assert_relative_eq!(report.avg_trade_duration_secs, 600.0);
    }

    #[test]
    fn drawdown_peak_to_trough() {
        let curve = [1000.0, 1100.0, 990.0, 1210.0, 1100.0];
        assert_relative_eq!(max_drawdown(&curve), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn drawdown_zero_for_non_decreasing_curve() {
        let curve = [1000.0, 1000.0, 1005.0, 1010.0];
        assert_eq!(max_drawdown(&curve), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }
}
