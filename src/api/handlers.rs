//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::config::{ApiConfig, Config};
use crate::coordinator::{Coordinator, Params, RequestOptions};
use crate::error::{ConfigError, GatewayError};
use crate::filter::{filter, paginate, unique_types, ActivityEditRecord, AuditRecord, TimestampRecord};
use crate::models::{
    ClearCacheQuery, ClearCacheResponse, HealthResponse, ListQuery, PageResponse, StatsResponse,
};

/// Backend endpoint serving the timestamp log
pub const TIMESTAMPS_ENDPOINT: &str = "timestamps";

/// Backend endpoint serving the activity edit history
pub const ACTIVITY_EDITS_ENDPOINT: &str = "activity-edit-history";

/// Application state shared across all handlers.
///
/// Both members are cheap handles; cloning shares the same cache and
/// connection pool.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator<Value>,
    pub client: ApiClient,
}

impl AppState {
    pub fn new(coordinator: Coordinator<Value>, client: ApiClient) -> Self {
        Self {
            coordinator,
            client,
        }
    }

    /// Creates the coordinator and client from configuration.
    ///
    /// Must run inside a tokio runtime (the coordinator spawns its janitor).
    pub fn from_config(config: &Config, api: &ApiConfig) -> Result<Self, ConfigError> {
        let client = ApiClient::new(api)?;
        let coordinator = Coordinator::new(config.coordinator.clone());
        Ok(Self::new(coordinator, client))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.coordinator.stats()))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearCacheQuery>,
) -> Json<ClearCacheResponse> {
    let key = query.key.as_deref();
    let cleared = state.coordinator.clear_cache(key);
    Json(ClearCacheResponse::new(key, cleared))
}

/// Handler for GET /api/*endpoint
///
/// Query parameters are forwarded upstream and take part in the cache key;
/// `refresh=true` forces a new fetch and is not forwarded. Endpoints that
/// would resolve outside the backend are refused with 400.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Query(mut query): Query<BTreeMap<String, String>>,
) -> Result<Json<Value>, GatewayError> {
    let endpoint = endpoint.trim_start_matches('/').to_string();
    state.client.endpoint_url(&endpoint)?;
    let options = refresh_options(query.remove("refresh").as_deref() == Some("true"));
    let params: Params = query
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    let fetch = state.client.fetcher::<Value>(&endpoint, &params);
    let payload = state
        .coordinator
        .api_request(&endpoint, fetch, Some(&params), options)
        .await?;

    Ok(Json(payload))
}

/// Handler for GET /timestamps
pub async fn timestamps_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PageResponse<TimestampRecord>>, GatewayError> {
    list_page(&state, TIMESTAMPS_ENDPOINT, &query).await
}

/// Handler for GET /activity-edits
pub async fn activity_edits_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PageResponse<ActivityEditRecord>>, GatewayError> {
    list_page(&state, ACTIVITY_EDITS_ENDPOINT, &query).await
}

/// Fetches a full list through the coordinator, then filters and paginates it.
async fn list_page<R>(
    state: &AppState,
    endpoint: &str,
    query: &ListQuery,
) -> Result<Json<PageResponse<R>>, GatewayError>
where
    R: AuditRecord + DeserializeOwned + Serialize + Clone + Send,
{
    if let Some(error_msg) = query.validate() {
        return Err(GatewayError::InvalidQuery(error_msg));
    }
    let criteria = query.criteria().map_err(GatewayError::InvalidQuery)?;

    let fetch = state.client.fetcher::<Value>(endpoint, &Params::new());
    let payload = state
        .coordinator
        .api_request(endpoint, fetch, None, refresh_options(query.refresh))
        .await?;
    let records: Vec<R> = decode_list(payload)?;

    let matching: Vec<R> = filter(&records, &criteria).into_iter().cloned().collect();
    let page = paginate(&matching, query.page(), query.page_size());

    Ok(Json(PageResponse::from_page(page, unique_types(&records))))
}

fn refresh_options(refresh: bool) -> RequestOptions {
    if refresh {
        RequestOptions::refresh()
    } else {
        RequestOptions::default()
    }
}

/// Accepts a bare JSON array or an object wrapping it under `data`.
fn decode_list<R: DeserializeOwned>(payload: Value) -> Result<Vec<R>, GatewayError> {
    let list = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => map
            .remove("data")
            .ok_or_else(|| GatewayError::Decode("object without a data array".to_string()))?,
        other => {
            return Err(GatewayError::Decode(format!(
                "expected a list, got {}",
                type_name(&other)
            )))
        }
    };
    serde_json::from_value(list).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
