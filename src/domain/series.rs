//! Bounded rolling series.
//!
//! Fixed-capacity append-only window: pushing beyond capacity evicts the
//! oldest element in O(1). Index 0 is always the oldest retained element.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct BoundedSeries<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedSeries<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, value: T) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.buf.get(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    /// The newest `n` elements in chronological order (fewer if the series
    /// is shorter).
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl BoundedSeries<f64> {
    /// Index and value of the series maximum, ties resolved by the last
    /// occurrence.
    pub fn argmax_last(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.buf.iter().enumerate() {
            match best {
                Some((_, bv)) if v < bv => {}
                _ => best = Some((i, v)),
            }
        }
        best
    }

    /// Index and value of the series minimum, ties resolved by the last
    /// occurrence.
    pub fn argmin_last(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.buf.iter().enumerate() {
            match best {
                Some((_, bv)) if v > bv => {}
                _ => best = Some((i, v)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_evicts_oldest_at_capacity() {
        let mut s = BoundedSeries::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            s.push(v);
        }
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(0), Some(&2.0));
        assert_eq!(s.last(), Some(&4.0));
    }

    #[test]
    fn tail_returns_newest_in_order() {
        let mut s = BoundedSeries::new(5);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            s.push(v);
        }
        let tail: Vec<f64> = s.tail(3).copied().collect();
        assert_eq!(tail, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn tail_longer_than_series_returns_all() {
        let mut s = BoundedSeries::new(5);
        s.push(1.0);
        s.push(2.0);
        let tail: Vec<f64> = s.tail(10).copied().collect();
        assert_eq!(tail, vec![1.0, 2.0]);
    }

    #[test]
    fn argmax_prefers_last_occurrence() {
        let mut s = BoundedSeries::new(8);
        for v in [1.0, 5.0, 2.0, 5.0, 3.0] {
            s.push(v);
        }
        assert_eq!(s.argmax_last(), Some((3, 5.0)));
    }

    #[test]
    fn argmin_prefers_last_occurrence() {
        let mut s = BoundedSeries::new(8);
        for v in [4.0, 1.0, 2.0, 1.0, 3.0] {
            s.push(v);
        }
        assert_eq!(s.argmin_last(), Some((3, 1.0)));
    }

    #[test]
    fn extremes_on_empty_series() {
        let s: BoundedSeries<f64> = BoundedSeries::new(4);
        assert_eq!(s.argmax_last(), None);
        assert_eq!(s.argmin_last(), None);
    }

    #[test]
    fn indices_follow_eviction() {
        let mut s = BoundedSeries::new(3);
        for v in [9.0, 1.0, 2.0, 3.0] {
            s.push(v);
        }
        // 9.0 evicted; max is now 3.0 at index 2
        assert_eq!(s.argmax_last(), Some((2, 3.0)));
    }

    #[test]
    fn clear_empties_series() {
        let mut s = BoundedSeries::new(3);
        s.push(1.0);
        s.clear();
        assert!(s.is_empty());
    }
}
