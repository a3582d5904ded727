//! Write Order Module
//!
//! Tracks the order in which keys were last written, for eviction.

use std::collections::VecDeque;

// == Write Order ==
/// Tracks write order for the eviction policy.
///
/// Only writes move a key; reads never do, so the back of the queue is
/// always the key with the oldest `stored_at`.
/// - Front = Most recently written
/// - Back = Least recently written
#[derive(Debug, Default)]
pub struct WriteOrder {
    order: VecDeque<String>,
}

impl WriteOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Write ==
    /// Marks a key as just written (moves to front).
    pub fn record_write(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently written key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Keys from most to least recently written.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
}
