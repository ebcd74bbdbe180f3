//! Windowed indicator primitives.
//!
//! Each function computes one value from the trailing window it is given;
//! the strategies own the rolling buffers and call these per update.

pub mod atr;
pub mod lwma;
pub mod roc;
pub mod sma;

pub use atr::average_true_range;
pub use lwma::linear_weighted_mean;
pub use roc::rate_of_change;
pub use sma::simple_mean;
