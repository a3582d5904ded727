//! Cache Module
//!
//! Result cache with TTL expiry and eviction by write order.

mod entry;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use order::WriteOrder;
pub use stats::CacheStats;
pub use store::{CacheStore, SweepReport};
