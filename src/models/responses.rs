//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::coordinator::CoordinatorStats;
use crate::filter::Page;

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CoordinatorStats,
    /// Cache hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(stats: CoordinatorStats) -> Self {
        let hit_rate = stats.cache.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    /// Success message
    pub message: String,
    /// Number of cached results dropped
    pub cleared: usize,
}

impl ClearCacheResponse {
    pub fn new(key: Option<&str>, cleared: usize) -> Self {
        let message = match key {
            Some(key) => format!("Cache entry '{key}' cleared"),
            None => "Cache cleared".to_string(),
        };
        Self { message, cleared }
    }
}

/// Response body for the audit list endpoints
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<R> {
    pub items: Vec<R>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// Every record type present in the unfiltered list
    pub types: Vec<String>,
}

impl<R: Clone> PageResponse<R> {
    pub fn from_page(page: Page<'_, R>, types: Vec<String>) -> Self {
        Self {
            items: page.items.to_vec(),
            page: page.page,
            page_size: page.page_size,
            total_items: page.total_items,
            total_pages: page.total_pages,
            types,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
