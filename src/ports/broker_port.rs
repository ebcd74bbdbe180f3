//! Broker client port trait and its request/response types.

use std::fmt;

use async_trait::async_trait;

use crate::domain::error::CycletraderError;

/// Binary contract direction on the broker side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractType {
    Call,
    Put,
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractType::Call => write!(f, "CALL"),
            ContractType::Put => write!(f, "PUT"),
        }
    }
}

/// Parameters for quoting and buying one contract. The same request is
/// used for the proposal and the subsequent buy.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub contract_type: ContractType,
    pub stake: f64,
    pub duration: u32,
    /// Broker duration unit code, e.g. "t" for ticks, "s" for seconds.
    pub duration_unit: String,
}

/// A priced quote for an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub ask_price: f64,
    pub payout: f64,
}

/// Acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub contract_id: i64,
    pub buy_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub balance: f64,
    pub currency: String,
}

/// Port for the order side of a broker session. Contracts expire on the
/// broker's side; there is no early-close operation.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Whether the session holds trading authorization. Unauthorized
    /// sessions may still quote but must never be sent orders.
    fn is_authorized(&self) -> bool;

    async fn balance(&self) -> Result<AccountBalance, CycletraderError>;

    async fn proposal(&self, request: &OrderRequest) -> Result<Proposal, CycletraderError>;

    async fn buy(&self, request: &OrderRequest) -> Result<OrderConfirmation, CycletraderError>;
}
