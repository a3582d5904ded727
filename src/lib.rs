//! Fetch Coordinator - request deduplication and result caching
//!
//! Sits between the admin front end and the backend REST API: identical
//! concurrent requests share one fetch, successful results are cached with a
//! TTL and a capacity bound, and audit lists are filtered and paginated in
//! memory.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use client::ApiClient;
pub use config::{ApiConfig, Config, CoordinatorConfig};
pub use coordinator::{build_key, Coordinator, CoordinatorStats, Params, RequestOptions};
pub use error::{ConfigError, EndpointError, GatewayError, RequestError};
