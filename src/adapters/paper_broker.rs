//! Logging-only broker adapter for dry runs and tests.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use log::info;

use crate::domain::error::CycletraderError;
use crate::ports::broker_port::{
    AccountBalance, BrokerPort, OrderConfirmation, OrderRequest, Proposal,
};

// Binary contracts on the paper book pay out slightly under 2x stake.
const PAYOUT_RATIO: f64 = 1.95;

/// Accepts every order at its ask price without touching a network.
/// Contract ids are sequential so callers can count accepted orders.
pub struct PaperBroker {
    authorized: bool,
    balance: f64,
    next_contract_id: AtomicI64,
}

impl PaperBroker {
    pub fn new(balance: f64) -> Self {
        Self {
            authorized: true,
            balance,
            next_contract_id: AtomicI64::new(1),
        }
    }

    /// A session that may quote but must never receive orders.
    pub fn unauthorized() -> Self {
        Self {
            authorized: false,
            ..Self::new(0.0)
        }
    }

    pub fn orders_placed(&self) -> i64 {
        self.next_contract_id.load(Ordering::SeqCst) - 1
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    fn is_authorized(&self) -> bool {
        self.authorized
    }

    async fn balance(&self) -> Result<AccountBalance, CycletraderError> {
        Ok(AccountBalance {
            balance: self.balance,
            currency: "USD".to_string(),
        })
    }

    async fn proposal(&self, request: &OrderRequest) -> Result<Proposal, CycletraderError> {
        Ok(Proposal {
            ask_price: request.stake,
            payout: request.stake * PAYOUT_RATIO,
        })
    }

    async fn buy(&self, request: &OrderRequest) -> Result<OrderConfirmation, CycletraderError> {
        if !self.authorized {
            return Err(CycletraderError::BrokerAuth {
                reason: "paper session not authorized for orders".to_string(),
            });
        }
        let contract_id = self.next_contract_id.fetch_add(1, Ordering::SeqCst);
        info!(
            "Paper fill: {} {} | stake ${:.2} | {}{} | contract {}",
            request.contract_type,
            request.symbol,
            request.stake,
            request.duration,
            request.duration_unit,
            contract_id
        );
        Ok(OrderConfirmation {
            contract_id,
            buy_price: request.stake,
        })
    }
}
