//! Backtest runner: single-threaded, strictly sequential candle replay.

use log::{debug, info, warn};

use crate::domain::candle::Candle;
use crate::domain::ledger::{PositionLedger, Trade};
use crate::domain::report::PerformanceReport;
use crate::domain::settings::BacktestSettings;
use crate::domain::signal::{Side, SignalKind};
use crate::domain::strategy::Strategy;

/// Everything a finished replay produces.
#[derive(Debug)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<f64>,
    pub report: PerformanceReport,
}

/// Replays `candles` through `strategy`, booking fills at candle close.
///
/// `htf_closes`, when present, is a higher-timeframe close series aligned
/// to `candles` by index. A malformed candle is logged and skipped without
/// aborting the run; skipped candles contribute no equity point. Any
/// position still open after the last candle is force-closed at that
/// candle's close.
pub fn run_backtest(
    strategy: &mut dyn Strategy,
    candles: &[Candle],
    settings: &BacktestSettings,
    htf_closes: Option<&[f64]>,
) -> BacktestResult {
    info!("Starting backtest: {} candles", candles.len());
    info!("Strategy: {}", strategy.name());
    info!("Initial balance: ${}", settings.initial_balance);
    info!("Stake per trade: ${}", settings.stake);

    strategy.reset();
    let mut ledger = PositionLedger::new(settings.initial_balance);

    for (idx, candle) in candles.iter().enumerate() {
        if !candle.is_valid() {
            warn!("Candle {idx} skipped: non-finite field or bad epoch");
            continue;
        }

        let htf_close = htf_closes.and_then(|closes| closes.get(idx)).copied();
        strategy.update(candle, htf_close);
        let signal = strategy.signal();
        debug!(
            "candle {} epoch={} signal={} strength={:.2}",
            idx, candle.epoch, signal.kind, signal.strength
        );

        match signal.kind {
            SignalKind::Buy | SignalKind::Sell if ledger.position().is_none() => {
                let side = match signal.kind {
                    SignalKind::Buy => Side::Long,
                    _ => Side::Short,
                };
                if let Some(position) = ledger.open(
                    side,
                    candle.close,
                    candle.epoch,
                    settings.stake,
                    signal.stop_loss,
                    signal.take_profit,
                ) {
                    info!(
                        "ENTRY {} @ ${:.4} | stake=${:.2}",
                        signal.kind, candle.close, settings.stake
                    );
                    strategy.set_position(Some(position));
                }
            }
            SignalKind::Close if ledger.position().is_some() => {
                if let Some(trade) = ledger.close(candle.close, candle.epoch, "Signal") {
                    info!(
                        "EXIT {} @ ${:.4} | PnL=${:.2} ({:.2}%) | reason={}",
                        trade.side, candle.close, trade.pnl, trade.pnl_pct, trade.exit_reason
                    );
                    strategy.set_position(None);
                }
            }
            _ => {}
        }

        ledger.record_equity();
    }

    if ledger.position().is_some() {
        if let Some(last) = candles.last() {
            if let Some(trade) = ledger.close(last.close, last.epoch, "End of backtest") {
                info!(
                    "EXIT {} @ ${:.4} | PnL=${:.2} ({:.2}%) | reason={}",
                    trade.side, last.close, trade.pnl, trade.pnl_pct, trade.exit_reason
                );
                strategy.set_position(None);
            }
        }
    }

    let report = PerformanceReport::compute(
        strategy.name(),
        ledger.trades(),
        ledger.equity_curve(),
        settings.initial_balance,
    );
    BacktestResult {
        trades: ledger.trades().to_vec(),
        equity_curve: ledger.equity_curve().to_vec(),
        report,
    }
}
