//! Cache Store Module
//!
//! Result cache combining HashMap storage with write-order tracking and TTL expiry.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, WriteOrder};

// == Sweep Report ==
/// What a sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries removed for outliving the TTL
    pub expired: usize,
    /// Entries removed to get back within capacity
    pub evicted: usize,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.expired + self.evicted
    }
}

// == Cache Store ==
/// Result cache with a single TTL and a capacity bound.
///
/// When the capacity is exceeded the entry with the oldest write is
/// evicted first, regardless of how recently it was read.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Write order, for eviction
    order: WriteOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries retained
    max_entries: usize,
    /// Maximum entry age
    ttl: Duration,
}

impl<T: Clone> CacheStore<T> {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries retained (0 retains nothing)
    /// * `ttl` - Maximum age of an entry served as a hit
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: WriteOrder::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl,
        }
    }

    // == Set ==
    /// Stores a value stamped with the current time.
    ///
    /// Overwriting a key resets its timestamp. If the cache then exceeds
    /// capacity, the oldest writes are evicted until it fits.
    pub fn set(&mut self, key: String, value: T) {
        self.order.record_write(&key);
        self.entries.insert(key, CacheEntry::new(value));
        self.enforce_capacity();
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns a clone of the value if present and younger than the TTL.
    ///
    /// An expired entry is removed on access and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        self.stats.record_miss();
        None
    }

    // == Contains ==
    /// True if a fresh entry exists. Does not touch statistics.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(self.ttl))
    }

    // == Age ==
    /// Age of a fresh entry, or None if absent or expired.
    pub fn age(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(CacheEntry::age)
    }

    // == Invalidate ==
    /// Removes one entry, or everything when `key` is None.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, key: Option<&str>) -> usize {
        let removed = match key {
            Some(key) => usize::from(self.remove_entry(key)),
            None => {
                let count = self.entries.len();
                self.entries.clear();
                self.order.clear();
                count
            }
        };
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Cleanup Expired ==
    /// Removes all entries older than the TTL.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    // == Enforce Capacity ==
    /// Evicts the oldest writes until at or under capacity.
    ///
    /// Returns the number of entries evicted.
    pub fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.max_entries {
            match self.order.evict_oldest() {
                Some(key) => {
                    self.entries.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }
        self.stats.record_evictions(evicted);
        self.stats.set_total_entries(self.entries.len());
        evicted
    }

    // == Sweep ==
    /// TTL cleanup followed by capacity enforcement.
    pub fn sweep(&mut self) -> SweepReport {
        SweepReport {
            expired: self.cleanup_expired(),
            evicted: self.enforce_capacity(),
        }
    }

    // == Keys ==
    /// Stored keys, most recently written first.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        self.order.remove(key);
        self.entries.remove(key).is_some()
    }
}
