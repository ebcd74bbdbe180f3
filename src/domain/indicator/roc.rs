//! Rate of change over a window.
//!
//! ROC = ((last - first) / first) * 100, 0 when the window is too short or
//! the first value is 0.

/// Percent change from the first to the last value of the window.
pub fn rate_of_change(window: &[f64]) -> f64 {
    match (window.first(), window.last()) {
        (Some(&first), Some(&last)) if window.len() >= 2 && first != 0.0 => {
            (last - first) / first * 100.0
        }
        _ => 0.0,
    }
}
