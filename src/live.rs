//! Live trading orchestrator.
//!
//! Candles arrive pushed from a broker feed; the engine runs the same
//! strategy contract as the backtester but quotes and submits orders
//! through a [`BrokerPort`]. Contracts expire on the broker's side, so a
//! CLOSE signal never submits an order. The local ledger still books the
//! close at the signal candle's price so final stats cover every round
//! trip.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::Instant;

use crate::domain::candle::Candle;
use crate::domain::error::CycletraderError;
use crate::domain::ledger::PositionLedger;
use crate::domain::settings::LiveSettings;
use crate::domain::signal::{Side, SignalKind, TradeSignal};
use crate::domain::strategy::Strategy;
use crate::ports::broker_port::{BrokerPort, ContractType, OrderRequest};

/// Spaces quote requests at least `min_interval` apart, sleeping out the
/// remainder when called too soon. The stamp is taken after the wait, so
/// back-to-back callers each pay the full interval.
pub struct QuoteThrottle {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl QuoteThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    fn wait_needed(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => self.min_interval.saturating_sub(now - last),
            None => Duration::ZERO,
        }
    }

    pub async fn acquire(&mut self) {
        let wait = self.wait_needed(Instant::now());
        if !wait.is_zero() {
            debug!("Throttling quote request for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_request = Some(Instant::now());
    }
}

/// Drives one strategy against one broker session. Exactly one candle is
/// processed at a time; all state is exclusively owned.
pub struct LiveEngine {
    strategy: Box<dyn Strategy>,
    broker: Arc<dyn BrokerPort>,
    settings: LiveSettings,
    ledger: PositionLedger,
    throttle: QuoteThrottle,
    running: bool,
}

impl LiveEngine {
    pub fn new(
        strategy: Box<dyn Strategy>,
        broker: Arc<dyn BrokerPort>,
        settings: LiveSettings,
        initial_balance: f64,
    ) -> Self {
        let throttle = QuoteThrottle::new(Duration::from_secs_f64(
            settings.min_quote_interval.max(0.0),
        ));
        Self {
            strategy,
            broker,
            settings,
            ledger: PositionLedger::new(initial_balance),
            throttle,
            running: false,
        }
    }

    /// Checks the account and begins accepting candles. An authorization
    /// or balance failure here is fatal; nothing has been traded yet.
    pub async fn start(&mut self) -> Result<(), CycletraderError> {
        info!("Starting live engine for {}", self.settings.symbol);
        info!("Strategy: {}", self.strategy.name());
        info!("Stake: ${}", self.settings.stake);

        if self.broker.is_authorized() {
            let account = self.broker.balance().await?;
            info!(
                "Account balance: {:.2} {}",
                account.balance, account.currency
            );
        } else {
            info!("Session not authorized for orders; running in demo mode");
        }

        self.running = true;
        info!("Live engine started");
        Ok(())
    }

    /// Halts candle processing and emits final stats. Safe to call at any
    /// time; the broker session closes when the engine is dropped.
    pub fn stop(&mut self) {
        info!("Stopping live engine");
        self.running = false;
        self.print_stats();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Processes one pushed candle end to end.
    pub async fn on_candle(&mut self, candle: &Candle) {
        if !self.running {
            return;
        }
        if !candle.is_valid() {
            warn!("Dropping candle with non-finite field or bad epoch");
            return;
        }

        self.strategy.update(candle, None);
        let signal = self.strategy.signal();
        debug!(
            "Candle: O={} H={} L={} C={} | Signal: {} (strength: {:.2})",
            candle.open, candle.high, candle.low, candle.close, signal.kind, signal.strength
        );

        self.execute_signal(&signal, candle).await;
    }

    async fn execute_signal(&mut self, signal: &TradeSignal, candle: &Candle) {
        if self.ledger.position().is_some() {
            if signal.kind == SignalKind::Close {
                info!("CLOSE signal received; contract closes at expiry on the broker side");
                if let Some(trade) = self.ledger.close(candle.close, candle.epoch, "Signal") {
                    info!(
                        "EXIT {} @ ${:.4} | PnL=${:.2} ({:.2}%)",
                        trade.side, candle.close, trade.pnl, trade.pnl_pct
                    );
                }
                self.strategy.set_position(None);
            }
            return;
        }

        match signal.kind {
            SignalKind::Buy => self.buy_contract(ContractType::Call, signal, candle).await,
            SignalKind::Sell => self.buy_contract(ContractType::Put, signal, candle).await,
            _ => {}
        }
    }

    /// Quotes and submits one contract. Broker failures here are logged
    /// and the engine moves on to the next candle.
    async fn buy_contract(
        &mut self,
        contract_type: ContractType,
        signal: &TradeSignal,
        candle: &Candle,
    ) {
        if self.settings.demo || !self.broker.is_authorized() {
            info!(
                "DEMO: {} would be opened | Stake: ${} | Signal: {:.2}",
                contract_type, self.settings.stake, signal.strength
            );
            return;
        }

        let request = OrderRequest {
            symbol: self.settings.symbol.clone(),
            contract_type,
            stake: self.settings.stake,
            duration: self.settings.duration,
            duration_unit: self.settings.duration_unit.clone(),
        };

        self.throttle.acquire().await;
        let quote = match self.broker.proposal(&request).await {
            Ok(quote) => quote,
            Err(e) => {
                error!("Proposal error: {}", e);
                return;
            }
        };
        info!(
            "Opening {} | Stake: ${} | Potential payout: ${:.2} | Signal strength: {:.2}",
            contract_type, self.settings.stake, quote.payout, signal.strength
        );

        let confirmation = match self.broker.buy(&request).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                error!("Failed to buy contract: {}", e);
                return;
            }
        };
        info!(
            "Contract {} accepted at ${:.2}",
            confirmation.contract_id, confirmation.buy_price
        );

        let side = match contract_type {
            ContractType::Call => Side::Long,
            ContractType::Put => Side::Short,
        };
        if let Some(position) = self.ledger.open(
            side,
            candle.close,
            candle.epoch,
            self.settings.stake,
            signal.stop_loss,
            signal.take_profit,
        ) {
            self.strategy.set_position(Some(position));
        }
    }

    fn print_stats(&self) {
        let trades = self.ledger.trades();
        let total = trades.len();
        let winning = trades.iter().filter(|t| t.pnl > 0.0).count();
        let losing = total - winning;
        let win_rate = if total > 0 {
            winning as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        info!("{}", "=".repeat(50));
        info!("Trading Statistics for {}", self.strategy.name());
        info!("{}", "=".repeat(50));
        info!("Total Trades: {}", total);
        info!("Winning Trades: {}", winning);
        info!("Losing Trades: {}", losing);
        info!("Win Rate: {:.2}%", win_rate);
        info!("Realized PnL: ${:.2}", self.ledger.realized_pnl());
        info!("{}", "=".repeat(50));
    }
}
