//! Port traits decoupling the domain from I/O concerns.

pub mod broker_port;
pub mod candle_store;
pub mod config_port;
