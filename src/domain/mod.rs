//! Core domain types and logic: candles, indicators, strategies, and the
//! backtest runner. Everything here is synchronous and side-effect free
//! apart from logging.

pub mod backtest;
pub mod candle;
pub mod enhanced;
pub mod error;
pub mod harmonic;
pub mod indicator;
pub mod ledger;
pub mod report;
pub mod series;
pub mod settings;
pub mod signal;
pub mod strategy;
