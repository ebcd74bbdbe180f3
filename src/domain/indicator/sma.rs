//! Simple mean over a window.

/// Arithmetic mean of the window. Returns 0 for an empty window.
pub fn simple_mean(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().sum::<f64>() / window.len() as f64
}
