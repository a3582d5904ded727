//! Client Module
//!
//! HTTP access to the backend REST API, shaped as fetch functions for the
//! coordinator.

mod api;

pub use api::ApiClient;
