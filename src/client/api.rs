//! Backend REST client.

use std::future::Future;

use anyhow::Context;
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::coordinator::Params;
use crate::error::{ConfigError, EndpointError};

// == Api Client ==
/// Thin wrapper over `reqwest` bound to the backend base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds a client, failing eagerly if the base URL is unusable.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "API_TIMEOUT_SECS",
                reason: e.to_string(),
            })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `endpoint` as a path under the base URL.
    ///
    /// Absolute URLs, scheme-relative paths and anything else that would
    /// leave the configured backend are rejected.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, EndpointError> {
        if endpoint.starts_with("//") {
            return Err(EndpointError::new(endpoint, "scheme-relative URL"));
        }
        let path = endpoint.trim_start_matches('/');
        if Url::parse(path).is_ok() {
            return Err(EndpointError::new(endpoint, "absolute URL"));
        }

        let url = self
            .base_url
            .join(path)
            .map_err(|_| EndpointError::new(endpoint, "not a valid path"))?;

        if url.origin() != self.base_url.origin() {
            return Err(EndpointError::new(endpoint, "resolves outside the backend"));
        }
        if !url.path().starts_with(self.base_url.path()) {
            return Err(EndpointError::new(endpoint, "escapes the base path"));
        }
        Ok(url)
    }

    /// Absolute URL for `endpoint` with `params` as the query string.
    pub fn url(&self, endpoint: &str, params: &Params) -> anyhow::Result<Url> {
        let mut url = self.endpoint_url(endpoint)?;

        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, &query_value(value));
            }
        }
        Ok(url)
    }

    /// `GET endpoint?params`, decoded as JSON.
    ///
    /// The returned future owns everything it needs, so it can be handed to
    /// the coordinator and run on another task.
    pub fn get_json<T>(
        &self,
        endpoint: &str,
        params: &Params,
    ) -> impl Future<Output = anyhow::Result<T>> + Send + 'static
    where
        T: DeserializeOwned + Send + 'static,
    {
        let http = self.http.clone();
        let url = self.url(endpoint, params);

        async move {
            let url = url?;
            let response = http
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("GET {url}"))?
                .error_for_status()
                .with_context(|| format!("GET {url}"))?;

            response
                .json::<T>()
                .await
                .with_context(|| format!("decoding response from {url}"))
        }
    }

    /// Zero-argument fetch function for [`Coordinator::request`](crate::coordinator::Coordinator::request).
    pub fn fetcher<T>(
        &self,
        endpoint: &str,
        params: &Params,
    ) -> impl FnOnce() -> BoxFuture<'static, anyhow::Result<T>> + Send + 'static
    where
        T: DeserializeOwned + Send + 'static,
    {
        let fut = self.get_json::<T>(endpoint, params);
        move || fut.boxed()
    }
}

/// Query-string form of a parameter: strings verbatim, everything else as JSON.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
