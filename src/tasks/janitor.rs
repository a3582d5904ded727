//! Cache Janitor Task
//!
//! Background task that periodically purges expired results outside of the
//! request path.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SweepReport;

/// Something the janitor can clean.
pub trait Sweep: Send + Sync + 'static {
    /// Drops expired entries, then enforces capacity.
    fn sweep(&self) -> SweepReport;
}

/// Spawns a task that sweeps `target` every `interval`.
///
/// The task holds only a weak reference: it stops on its own once the
/// target is dropped. The returned handle aborts it earlier.
///
/// # Example
/// ```ignore
/// // `inner` implements `Sweep` by locking its cache and calling `CacheStore::sweep`
/// let janitor = spawn_janitor(Arc::downgrade(&inner), ttl / 2);
/// // Later, on teardown:
/// janitor.abort();
/// ```
pub fn spawn_janitor<S: Sweep>(target: Weak<S>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(interval = ?interval, "Starting cache janitor");

        loop {
            tokio::time::sleep(interval).await;

            let Some(target) = target.upgrade() else {
                debug!("Janitor target dropped, stopping");
                break;
            };
            let report = target.sweep();

            if report.removed() > 0 {
                info!(
                    expired = report.expired,
                    evicted = report.evicted,
                    "Janitor sweep removed cached results"
                );
            } else {
                debug!("Janitor sweep: nothing to remove");
            }
        }
    })
}
