//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    activity_edits_handler, clear_cache_handler, health_handler, proxy_handler, stats_handler,
    timestamps_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, for the browser-hosted admin front end
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/api/*endpoint", get(proxy_handler))
        .route("/timestamps", get(timestamps_handler))
        .route("/activity-edits", get(activity_edits_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
