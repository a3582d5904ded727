//! Error types for the coordinator and the gateway
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Request Error Enum ==
/// Failure of a coordinated request.
///
/// Cloneable so that every caller joined to the same in-flight operation
/// receives the same error. The fetch error itself sits behind an `Arc`,
/// so all of them point at the identical object.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    /// The fetch function rejected
    #[error("fetch failed: {0:#}")]
    Fetch(Arc<anyhow::Error>),

    /// The task driving the fetch panicked or was aborted
    #[error("fetch task aborted: {0}")]
    Aborted(String),

    /// The coordinator was disposed before the request was issued
    #[error("coordinator has been disposed")]
    Disposed,
}

impl RequestError {
    /// Wraps a fetch failure.
    pub fn fetch(err: anyhow::Error) -> Self {
        RequestError::Fetch(Arc::new(err))
    }
}

// == Config Error Enum ==
/// Missing or unusable configuration, raised before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is absent or empty
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),

    /// A value is present but cannot be used
    #[error("invalid configuration value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

// == Endpoint Error ==
/// An endpoint that does not resolve to a path under the backend base URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("endpoint {endpoint:?} rejected: {reason}")]
pub struct EndpointError {
    pub endpoint: String,
    pub reason: &'static str,
}

impl EndpointError {
    pub fn new(endpoint: &str, reason: &'static str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            reason,
        }
    }
}

// == Gateway Error Enum ==
/// Error surfaced by the HTTP gateway handlers.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The coordinated request failed
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The upstream payload did not have the expected shape
    #[error("unexpected upstream payload: {0}")]
    Decode(String),

    /// Query parameters could not be used
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<EndpointError> for GatewayError {
    fn from(err: EndpointError) -> Self {
        GatewayError::InvalidQuery(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Request(RequestError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            GatewayError::Request(RequestError::Aborted(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Request(RequestError::Disposed) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Decode(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for coordinated requests.
pub type Result<T> = std::result::Result<T, RequestError>;
