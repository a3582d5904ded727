//! Per-key request counters.

use std::collections::{BTreeMap, HashMap};

use crate::cache::WriteOrder;

/// Logical request attempts per key, kept for the most recently requested
/// keys only.
#[derive(Debug)]
pub struct RequestCounts {
    counts: HashMap<String, u64>,
    order: WriteOrder,
    capacity: usize,
}

impl RequestCounts {
    /// Tracks at most `capacity` keys (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            counts: HashMap::new(),
            order: WriteOrder::new(),
            capacity: capacity.max(1),
        }
    }

    /// Counts one attempt for `key` and returns its new total.
    ///
    /// The least recently requested keys are forgotten once over capacity.
    pub fn record(&mut self, key: &str) -> u64 {
        self.order.record_write(key);
        let count = self.counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        let total = *count;

        while self.counts.len() > self.capacity {
            match self.order.evict_oldest() {
                Some(oldest) => {
                    self.counts.remove(&oldest);
                }
                None => break,
            }
        }
        total
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Sorted copy of the counters.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut counts = RequestCounts::new(10);
        assert_eq!(counts.record("a"), 1);
        assert_eq!(counts.record("a"), 2);
        assert_eq!(counts.record("b"), 1);
        assert_eq!(counts.get("a"), Some(2));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_forgets_least_recently_requested() {
        let mut counts = RequestCounts::new(2);
        counts.record("a");
        counts.record("b");
        counts.record("a");
        counts.record("c");

        assert_eq!(counts.len(), 2);
        assert_eq!(counts.get("b"), None);
        assert_eq!(counts.get("a"), Some(2));
        assert_eq!(counts.get("c"), Some(1));
    }

    #[test]
    fn test_zero_capacity_keeps_latest_key() {
        let mut counts = RequestCounts::new(0);
        counts.record("a");
        counts.record("b");
        assert_eq!(counts.snapshot().into_iter().collect::<Vec<_>>(), vec![("b".to_string(), 1)]);
    }

    #[test]
    fn test_clear() {
        let mut counts = RequestCounts::new(4);
        counts.record("a");
        counts.clear();
        assert!(counts.is_empty());
        assert_eq!(counts.record("a"), 1);
    }
}
