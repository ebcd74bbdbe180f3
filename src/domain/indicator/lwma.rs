//! Linear-weighted mean.
//!
//! LWMA(n) = (1*P[0] + 2*P[1] + ... + n*P[n-1]) / (n*(n+1)/2)
//! with ascending weights, so the newest price carries the most weight.

/// Weighted mean of the whole window. Returns 0 for an empty window.
pub fn linear_weighted_mean(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len();
    let divisor = (n * (n + 1)) as f64 / 2.0;
    let weighted_sum: f64 = window
        .iter()
        .enumerate()
        .map(|(i, &p)| (i + 1) as f64 * p)
        .sum();
    weighted_sum / divisor
}
