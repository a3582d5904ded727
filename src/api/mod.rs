//! API Module
//!
//! HTTP handlers and routing for the gateway in front of the backend REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Coordinator diagnostics
//! - `DELETE /cache` - Clear one (`?key=`) or all cached results
//! - `GET /api/*endpoint` - Coordinated, cached passthrough to the backend
//! - `GET /timestamps` - Filtered, paginated timestamp log
//! - `GET /activity-edits` - Filtered, paginated activity edit history

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
