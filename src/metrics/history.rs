//! Bounded rolling sample histories.

use std::collections::VecDeque;

/// Fixed-capacity ring of samples; pushing onto a full ring evicts the
/// oldest sample.
#[derive(Debug, Clone)]
pub struct RingHistory<T: Copy> {
    samples: VecDeque<T>,
    capacity: usize,
}

/// Default number of retained samples.
pub const DEFAULT_CAPACITY: usize = 100;

impl<T: Copy> RingHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Oldest-to-newest copy of the retained samples.
    pub fn samples(&self) -> Vec<T> {
        self.samples.iter().copied().collect()
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<T> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<T: Copy> Default for RingHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut history = RingHistory::new(3);
        for i in 0..5u64 {
            history.push(i);
        }
        assert_eq!(history.samples(), vec![2, 3, 4]);
        assert_eq!(history.latest(), Some(4));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn default_capacity_is_one_hundred() {
        let mut history = RingHistory::default();
        for i in 0..150u64 {
            history.push(i);
        }
        assert_eq!(history.len(), 100);
        assert_eq!(history.samples()[0], 50);
    }
}
