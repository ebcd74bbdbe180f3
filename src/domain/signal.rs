//! Trade signals emitted by strategies.

use std::collections::BTreeMap;
use std::fmt;

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// What a strategy wants done with the next candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
    Close,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Hold => write!(f, "HOLD"),
            SignalKind::Close => write!(f, "CLOSE"),
        }
    }
}

/// A strategy decision plus its risk framing.
///
/// `strength` is always in [0, 1]. Stop and target prices are advisory risk
/// limits carried for the ledger and logs; they do not trigger exits.
/// `metadata` holds per-signal diagnostics surfaced to logs and reports
/// (booleans encode as 0/1).
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSignal {
    pub kind: SignalKind,
    pub strength: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub metadata: BTreeMap<String, f64>,
}

impl TradeSignal {
    pub fn hold() -> Self {
        Self {
            kind: SignalKind::Hold,
            strength: 0.0,
            stop_loss: None,
            take_profit: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn close() -> Self {
        Self {
            kind: SignalKind::Close,
            strength: 1.0,
            stop_loss: None,
            take_profit: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn entry(
        kind: SignalKind,
        strength: f64,
        stop_loss: f64,
        take_profit: f64,
        metadata: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            kind,
            strength,
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
            metadata,
        }
    }

    /// Entry side implied by the signal kind, if any.
    pub fn side(&self) -> Option<Side> {
        match self.kind {
            SignalKind::Buy => Some(Side::Long),
            SignalKind::Sell => Some(Side::Short),
            SignalKind::Hold | SignalKind::Close => None,
        }
    }
}
