//! cycletrader — harmonic cycle signal engine, backtester, and live runner.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The [`live`] module drives a
//! strategy against a broker port one candle at a time.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod live;
pub mod ports;
