//! Request Coordinator
//!
//! Answers requests from the result cache, joins an identical request that is
//! already in flight, or starts a new fetch, so that at most one fetch per key
//! runs at any time.
//!
//! Cache lookup, in-flight lookup and in-flight registration happen inside a
//! single critical section that is never held across an `.await`, so two
//! callers can never both decide to start a fetch for the same key.

mod counts;
mod inflight;
mod key;

pub use counts::RequestCounts;
pub use inflight::{InFlightRegistry, SharedOperation};
pub use key::{build_key, endpoint_key, Params};

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore, SweepReport};
use crate::config::CoordinatorConfig;
use crate::error::{RequestError, Result};
use crate::tasks::{spawn_janitor, Sweep};

// == Request Options ==
/// Per-request cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Skip the cache read and always fetch (joins an in-flight fetch if any)
    pub force_refresh: bool,
    /// Read from and write to the cache
    pub use_cache: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            force_refresh: false,
            use_cache: true,
        }
    }
}

impl RequestOptions {
    /// Fetch even when a fresh result is cached, then overwrite it.
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }

    /// Neither read nor write the cache.
    pub fn no_cache() -> Self {
        Self {
            use_cache: false,
            ..Self::default()
        }
    }
}

// == Coordinator Stats ==
/// Diagnostic snapshot of a coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorStats {
    pub cache_size: usize,
    pub pending_requests: usize,
    /// Logical request attempts per key, for the most recently requested
    /// `max(max_cache_size, 1)` keys
    pub request_counts: BTreeMap<String, u64>,
    /// Cached keys, most recently written first
    pub cache_keys: Vec<String>,
    pub pending_keys: Vec<String>,
    pub cache: CacheStats,
}

struct State<T: Clone> {
    cache: CacheStore<T>,
    inflight: InFlightRegistry<T>,
    counters: RequestCounts,
    disposed: bool,
}

struct Inner<T: Clone> {
    state: Mutex<State<T>>,
    config: CoordinatorConfig,
    janitor: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Sweep for Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> SweepReport {
        let mut state = self.state.lock();
        if state.disposed {
            return SweepReport::default();
        }
        state.cache.sweep()
    }
}

impl<T: Clone> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.janitor.get_mut().take() {
            handle.abort();
        }
    }
}

/// Removes the in-flight registration if the fetch task exits without
/// settling normally (panic or abort).
struct SettleGuard<T: Clone> {
    inner: Weak<Inner<T>>,
    key: String,
    id: u64,
    armed: bool,
}

impl<T: Clone> SettleGuard<T> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T: Clone> Drop for SettleGuard<T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.state.lock().inflight.remove_if(&self.key, self.id);
        }
    }
}

// == Coordinator ==
/// Deduplicating, caching front for an arbitrary async fetch.
///
/// Cloning is cheap; clones share the same cache and registry. Must be
/// created inside a tokio runtime because it spawns its janitor.
pub struct Coordinator<T: Clone> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Coordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a coordinator and starts its janitor at `ttl / 2`.
    pub fn new(config: CoordinatorConfig) -> Self {
        let state = State {
            cache: CacheStore::new(config.max_cache_size, config.cache_ttl),
            inflight: InFlightRegistry::new(),
            counters: RequestCounts::new(config.max_cache_size),
            disposed: false,
        };
        let inner = Arc::new(Inner {
            state: Mutex::new(state),
            config: config.clone(),
            janitor: Mutex::new(None),
        });

        let handle = spawn_janitor(Arc::downgrade(&inner), config.janitor_interval());
        *inner.janitor.lock() = Some(handle);

        Self { inner }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Resolves `key` from the cache, an in-flight fetch, or a new call to `fetch`.
    ///
    /// `fetch` is invoked at most once per call and never when the request
    /// is answered from the cache or joins an in-flight fetch. A failure is
    /// not retried; it reaches every caller joined to that fetch and leaves
    /// no cache entry.
    pub async fn request<F, Fut>(
        &self,
        key: impl Into<String>,
        fetch: F,
        options: RequestOptions,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let key = key.into();
        let debug_mode = self.inner.config.debug_mode;

        let operation = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return Err(RequestError::Disposed);
            }
            state.counters.record(&key);

            if options.use_cache && !options.force_refresh {
                let report = state.cache.sweep();
                if debug_mode && report.removed() > 0 {
                    debug!(expired = report.expired, evicted = report.evicted, "Inline sweep");
                }
                if let Some(value) = state.cache.get(&key) {
                    if debug_mode {
                        debug!(key = %key, "Cache hit");
                    }
                    return Ok(value);
                }
                if debug_mode {
                    debug!(key = %key, "Cache miss");
                }
            }

            match state.inflight.join(&key) {
                Some(operation) => {
                    if debug_mode {
                        debug!(key = %key, "Joining in-flight request");
                    }
                    operation
                }
                None => {
                    let id = state.inflight.next_id();
                    let operation = self.start(key.clone(), id, fetch, options.use_cache);
                    state.inflight.register(key, id, operation.clone());
                    operation
                }
            }
        };

        operation.await
    }

    /// [`Coordinator::request`] keyed by `(endpoint, params)`.
    pub async fn api_request<F, Fut>(
        &self,
        endpoint: &str,
        fetch: F,
        params: Option<&Params>,
        options: RequestOptions,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let key = match params {
            Some(params) => build_key(endpoint, params),
            None => endpoint_key(endpoint),
        };
        self.request(key, fetch, options).await
    }

    /// Spawns the fetch and returns a shareable handle to its result.
    ///
    /// The fetch runs to completion even if every caller stops awaiting.
    fn start<F, Fut>(&self, key: String, id: u64, fetch: F, use_cache: bool) -> SharedOperation<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let weak = Arc::downgrade(&self.inner);
        let debug_mode = self.inner.config.debug_mode;

        let task = tokio::spawn(async move {
            let guard = SettleGuard {
                inner: weak.clone(),
                key: key.clone(),
                id,
                armed: true,
            };
            let started = Instant::now();
            if debug_mode {
                debug!(key = %key, "Fetch started");
            }

            let result = fetch().await.map_err(RequestError::fetch);

            if let Some(inner) = weak.upgrade() {
                let mut state = inner.state.lock();
                if let Ok(value) = &result {
                    if use_cache && !state.disposed {
                        state.cache.set(key.clone(), value.clone());
                    }
                }
                state.inflight.remove_if(&key, id);
            }
            guard.disarm();

            if debug_mode {
                debug!(
                    key = %key,
                    elapsed = ?started.elapsed(),
                    ok = result.is_ok(),
                    "Fetch settled"
                );
            }
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => Err(RequestError::Aborted(err.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    /// Drops one cached result, or all of them when `key` is None.
    pub fn clear_cache(&self, key: Option<&str>) -> usize {
        let removed = self.inner.state.lock().cache.invalidate(key);
        if self.inner.config.debug_mode {
            debug!(key = ?key, removed, "Cache cleared");
        }
        removed
    }

    /// Stops new callers from joining the in-flight fetch for `key`.
    ///
    /// The fetch itself keeps running and still settles for every caller
    /// already awaiting it.
    pub fn cancel_request(&self, key: &str) -> bool {
        let removed = self.inner.state.lock().inflight.remove(key);
        if self.inner.config.debug_mode && removed {
            debug!(key = %key, "In-flight registration cancelled");
        }
        removed
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.inner.state.lock().cache.contains(key)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.inner.state.lock().inflight.has(key)
    }

    /// Age of the cached result for `key`, or None if absent or expired.
    pub fn cache_age(&self, key: &str) -> Option<Duration> {
        self.inner.state.lock().cache.age(key)
    }

    pub fn stats(&self) -> CoordinatorStats {
        let state = self.inner.state.lock();
        CoordinatorStats {
            cache_size: state.cache.len(),
            pending_requests: state.inflight.len(),
            request_counts: state.counters.snapshot(),
            cache_keys: state.cache.keys(),
            pending_keys: state.inflight.keys(),
            cache: state.cache.stats(),
        }
    }

    /// Stops the janitor and clears all state. Later requests fail with
    /// [`RequestError::Disposed`].
    pub fn dispose(&self) {
        if let Some(handle) = self.inner.janitor.lock().take() {
            handle.abort();
        }
        let mut state = self.inner.state.lock();
        state.cache.invalidate(None);
        state.inflight.clear();
        state.counters.clear();
        state.disposed = true;
        if self.inner.config.debug_mode {
            debug!("Coordinator disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn coordinator() -> Coordinator<u32> {
        Coordinator::new(CoordinatorConfig::default().with_debug(true))
    }

    #[tokio::test]
    async fn test_request_caches_success() {
        let coordinator = coordinator();

        let value = coordinator
            .request("k", || async { Ok(5) }, RequestOptions::default())
            .await;
        assert_eq!(assert_ok!(value), 5);
        assert!(coordinator.is_cached("k"));
        assert!(!coordinator.is_pending("k"));
        assert!(coordinator.cache_age("k").is_some());
    }

    #[tokio::test]
    async fn test_failure_leaves_no_trace() {
        let coordinator = coordinator();

        let result = coordinator
            .request("k", || async { Err(anyhow::anyhow!("503 from backend")) }, RequestOptions::default())
            .await;

        let err = assert_err!(result);
        assert!(err.to_string().contains("503 from backend"));
        assert!(!coordinator.is_cached("k"));
        assert!(!coordinator.is_pending("k"));
    }

    #[tokio::test]
    async fn test_no_cache_skips_write() {
        let coordinator = coordinator();

        coordinator
            .request("k", || async { Ok(1) }, RequestOptions::no_cache())
            .await
            .unwrap();

        assert!(!coordinator.is_cached("k"));
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_cleaned_up() {
        let coordinator = coordinator();

        let result = coordinator
            .request(
                "k",
                || async {
                    if true {
                        panic!("fetch blew up");
                    }
                    Ok(1)
                },
                RequestOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(RequestError::Aborted(_))));
        assert!(!coordinator.is_pending("k"));
    }

    #[tokio::test]
    async fn test_request_counts() {
        let coordinator = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            coordinator
                .request(
                    "k",
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(1)
                    },
                    RequestOptions::default(),
                )
                .await
                .unwrap();
        }

        let stats = coordinator.stats();
        assert_eq!(stats.request_counts.get("k"), Some(&3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.cache.hits, 2);
        assert_eq!(stats.cache_keys, vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_dispose_clears_and_rejects() {
        let coordinator = coordinator();
        coordinator
            .request("k", || async { Ok(1) }, RequestOptions::default())
            .await
            .unwrap();

        coordinator.dispose();

        assert!(coordinator.is_disposed());
        let stats = coordinator.stats();
        assert_eq!(stats.cache_size, 0);
        assert!(stats.request_counts.is_empty());

        let result = coordinator
            .request("k", || async { Ok(2) }, RequestOptions::default())
            .await;
        assert!(matches!(result, Err(RequestError::Disposed)));
    }

    #[tokio::test]
    async fn test_api_request_uses_built_key() {
        let coordinator = coordinator();
        let mut params = Params::new();
        params.insert("page".to_string(), serde_json::json!(1));

        coordinator
            .api_request("students", || async { Ok(9) }, Some(&params), RequestOptions::default())
            .await
            .unwrap();

        assert!(coordinator.is_cached(&build_key("students", &params)));
        assert!(!coordinator.is_cached(&endpoint_key("students")));
    }
}
