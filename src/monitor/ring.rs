//! Fixed-capacity ring buffer with drop-oldest retention.
//!
//! Retention is an explicit accuracy/memory tradeoff: consumers reason over
//! a recent window, not all-time history, and the oldest entry is silently
//! dropped once capacity is reached. The drop count is tracked so the
//! tradeoff stays observable.

use std::collections::VecDeque;

#[derive(Debug)]
pub struct Ring<T> {
    buf: VecDeque<T>,
    capacity: usize,
    dropped: u64,
}

impl<T> Ring<T> {
    /// Create a ring with the given capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append an item, dropping the oldest if the ring is full.
    pub fn push(&mut self, item: T) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
            self.dropped += 1;
        }
        self.buf.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.buf.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many items have been dropped since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
