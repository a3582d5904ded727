//! In-Flight Registry
//!
//! At most one shared pending operation per key.

use std::collections::HashMap;
use std::fmt;

use futures::future::{BoxFuture, Shared};

use crate::error::Result;

/// A pending fetch that any number of callers can await.
pub type SharedOperation<T> = Shared<BoxFuture<'static, Result<T>>>;

struct Registration<T: Clone> {
    id: u64,
    operation: SharedOperation<T>,
}

// == In-Flight Registry ==
/// Maps keys to the operation currently resolving them.
///
/// Each registration gets an id, so the operation that settles can remove
/// its own registration without touching a newer one for the same key.
pub struct InFlightRegistry<T: Clone> {
    operations: HashMap<String, Registration<T>>,
    next_id: u64,
}

impl<T: Clone> fmt::Debug for InFlightRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("keys", &self.keys())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<T: Clone> Default for InFlightRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> InFlightRegistry<T> {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.operations.contains_key(key)
    }

    /// Returns a handle to the operation resolving `key`, if any.
    pub fn join(&self, key: &str) -> Option<SharedOperation<T>> {
        self.operations.get(key).map(|r| r.operation.clone())
    }

    /// Reserves the id the next registration will carry.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Stores `operation` under `key`, replacing any previous registration.
    pub fn register(&mut self, key: String, id: u64, operation: SharedOperation<T>) {
        self.operations.insert(key, Registration { id, operation });
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.operations.remove(key).is_some()
    }

    /// Removes the registration for `key` only if it is still `id`.
    pub fn remove_if(&mut self, key: &str, id: u64) -> bool {
        match self.operations.get(key) {
            Some(registration) if registration.id == id => {
                self.operations.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.operations.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}
