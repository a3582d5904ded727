//! Cache Entry Module
//!
//! Defines a single cached result and its write timestamp.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A cached result plus the instant it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// When the value was written
    pub stored_at: Instant,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    // == Age ==
    /// Time elapsed since the value was written.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.stored_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl`.
    ///
    /// Boundary condition: an entry is expired once its age is greater than
    /// or equal to the TTL, so a read at exactly `stored_at + ttl` misses.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}
