//! Fixed-capacity ring buffer for trajectories and signal logs.

use alloc::collections::VecDeque;
use alloc::vec::Vec as AllocVec;

/// Keeps the most recent `capacity` samples; pushing onto a full buffer
/// drops the oldest one.
#[derive(Clone, Debug)]
pub struct History<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        History {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.samples.front()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<T: Clone> History<T> {
    pub fn to_vec(&self) -> AllocVec<T> {
        self.samples.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_when_full() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(i);
        }
        assert_eq!(h.len(), 3);
        assert!(h.is_full());
        assert_eq!(h.to_vec(), alloc::vec![2, 3, 4]);
        assert_eq!(h.oldest(), Some(&2));
        assert_eq!(h.latest(), Some(&4));
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut h = History::new(0);
        h.push('a');
        h.push('b');
        assert_eq!(h.capacity(), 1);
        assert_eq!(h.latest(), Some(&'b'));
    }

    #[test]
    fn clear_empties() {
        let mut h = History::new(4);
        h.push(1.0f64);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.latest(), None);
    }
}
