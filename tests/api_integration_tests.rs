//! Integration Tests for API Endpoints
//!
//! Runs the gateway router against a local stand-in for the backend and
//! checks full request/response cycles.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use fetch_coordinator::{
    api::create_router, coordinator::endpoint_key, ApiClient, ApiConfig, AppState, Coordinator,
    CoordinatorConfig,
};
use futures::future::join_all;
use serde_json::{json, Value};
use tower::ServiceExt;

// == Backend Stand-in ==

#[derive(Clone, Default)]
struct Backend {
    timestamp_hits: Arc<AtomicUsize>,
    student_hits: Arc<AtomicUsize>,
}

impl Backend {
    fn timestamp_hits(&self) -> usize {
        self.timestamp_hits.load(Ordering::SeqCst)
    }

    fn student_hits(&self) -> usize {
        self.student_hits.load(Ordering::SeqCst)
    }
}

/// 25 records: odd ids are logins, ids 1..=12 fall on 2024-05-10, the rest on 2024-05-11.
fn timestamp_records() -> Vec<Value> {
    (1..=25)
        .map(|id| {
            let day = if id <= 12 { 10 } else { 11 };
            json!({
                "id": id,
                "user_name": format!("User {id}"),
                "email": format!("user{id}@uni.test"),
                "ip_address": format!("10.0.0.{id}"),
                "action": if id % 2 == 1 { "login" } else { "logout" },
                "created_at": format!("2024-05-{day} 08:30:00"),
            })
        })
        .collect()
}

async fn backend_timestamps(State(backend): State<Backend>) -> Json<Value> {
    backend.timestamp_hits.fetch_add(1, Ordering::SeqCst);
    // Keep the fetch open long enough for concurrent callers to pile up
    tokio::time::sleep(Duration::from_millis(100)).await;
    Json(json!({ "data": timestamp_records() }))
}

async fn backend_students(
    State(backend): State<Backend>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Json<Value> {
    let hit = backend.student_hits.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "query": query, "hit": hit }))
}

async fn backend_broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_backend() -> (u16, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/timestamps", get(backend_timestamps))
        .route("/students", get(backend_students))
        .route("/broken", get(backend_broken))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (port, backend)
}

// == Helper Functions ==

async fn create_test_app() -> (Router, Backend) {
    let (port, backend) = spawn_backend().await;
    let client = ApiClient::new(&ApiConfig::new("http", "127.0.0.1", Some(port))).unwrap();
    let state = AppState::new(Coordinator::new(CoordinatorConfig::default()), client);
    (create_router(state), backend)
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request(method, uri)).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn ids(page: &Value) -> Vec<i64> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app().await;

    let (status, json) = call(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

// == List Endpoint Tests ==

#[tokio::test]
async fn test_concurrent_list_requests_reach_backend_once() {
    let (app, backend) = create_test_app().await;

    let calls = (0..5).map(|_| call(&app, "GET", "/timestamps"));
    let responses = join_all(calls).await;

    for (status, json) in &responses {
        assert_eq!(*status, StatusCode::OK);
        assert_eq!(json["total_items"], 25);
    }
    assert_eq!(backend.timestamp_hits(), 1);

    // Served from cache afterwards
    let (status, _) = call(&app, "GET", "/timestamps?page=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(backend.timestamp_hits(), 1);
}

#[tokio::test]
async fn test_list_pagination() {
    let (app, _) = create_test_app().await;

    let (status, json) = call(&app, "GET", "/timestamps?page=2&page_size=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), (11..=20).collect::<Vec<i64>>());
    assert_eq!(json["page"], 2);
    assert_eq!(json["total_pages"], 3);
    assert_eq!(json["types"], json!(["login", "logout"]));

    let (_, last) = call(&app, "GET", "/timestamps?page=3&page_size=10").await;
    assert_eq!(ids(&last), (21..=25).collect::<Vec<i64>>());

    let (_, past_end) = call(&app, "GET", "/timestamps?page=4&page_size=10").await;
    assert!(ids(&past_end).is_empty());
}

#[tokio::test]
async fn test_list_filters() {
    let (app, backend) = create_test_app().await;

    let (status, json) = call(&app, "GET", "/timestamps?type=login&date=2024-05-10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![1, 3, 5, 7, 9, 11]);
    assert_eq!(json["total_items"], 6);
    // Types come from the unfiltered list
    assert_eq!(json["types"], json!(["login", "logout"]));

    let (_, json) = call(&app, "GET", "/timestamps?search=USER2%40UNI").await;
    assert_eq!(ids(&json), vec![2, 20, 21, 22, 23, 24, 25]);

    // Every filter combination reuses the one cached list
    assert_eq!(backend.timestamp_hits(), 1);
}

#[tokio::test]
async fn test_list_rejects_bad_query() {
    let (app, backend) = create_test_app().await;

    let (status, json) = call(&app, "GET", "/timestamps?page_size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("page_size"));

    let (status, _) = call(&app, "GET", "/timestamps?date=10-05-2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(backend.timestamp_hits(), 0);
}

// == Proxy Endpoint Tests ==

#[tokio::test]
async fn test_proxy_caches_per_params() {
    let (app, backend) = create_test_app().await;

    let (status, first) = call(&app, "GET", "/api/students?grade=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["query"], json!({ "grade": "3" }));

    let (_, again) = call(&app, "GET", "/api/students?grade=3").await;
    assert_eq!(again["hit"], 1);

    let (_, other) = call(&app, "GET", "/api/students?grade=4").await;
    assert_eq!(other["hit"], 2);
    assert_eq!(backend.student_hits(), 2);
}

#[tokio::test]
async fn test_proxy_refresh_refetches_and_overwrites() {
    let (app, backend) = create_test_app().await;

    call(&app, "GET", "/api/students?grade=3").await;
    let (status, refreshed) = call(&app, "GET", "/api/students?grade=3&refresh=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["hit"], 2);
    // refresh is not forwarded upstream
    assert_eq!(refreshed["query"], json!({ "grade": "3" }));

    let (_, cached) = call(&app, "GET", "/api/students?grade=3").await;
    assert_eq!(cached["hit"], 2);
    assert_eq!(backend.student_hits(), 2);
}

#[tokio::test]
async fn test_proxy_stays_on_configured_backend() {
    let (app, backend) = create_test_app().await;
    let (other_port, other) = spawn_backend().await;

    let uri = format!("/api/http:%2F%2F127.0.0.1:{other_port}%2Fstudents");
    let (status, json) = call(&app, "GET", &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("absolute URL"));
    assert_eq!(other.student_hits(), 0);
    assert_eq!(backend.student_hits(), 0);

    let (_, stats) = call(&app, "GET", "/stats").await;
    assert_eq!(stats["cache_size"], 0);
    assert_eq!(stats["request_counts"], json!({}));
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let (app, _) = create_test_app().await;

    let (status, json) = call(&app, "GET", "/api/broken").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("500"));

    let (_, stats) = call(&app, "GET", "/stats").await;
    assert_eq!(stats["cache_size"], 0);
    assert_eq!(stats["pending_requests"], 0);
}

// == Cache Management Tests ==

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let (app, backend) = create_test_app().await;

    call(&app, "GET", "/timestamps").await;
    let (status, json) = call(&app, "DELETE", "/cache").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], 1);

    call(&app, "GET", "/timestamps").await;
    assert_eq!(backend.timestamp_hits(), 2);
}

#[tokio::test]
async fn test_clear_single_key() {
    let (app, backend) = create_test_app().await;

    call(&app, "GET", "/timestamps").await;
    call(&app, "GET", "/api/students").await;

    let key = endpoint_key("timestamps");
    let uri = format!("/cache?key={}", urlencode(&key));
    let (_, json) = call(&app, "DELETE", &uri).await;
    assert_eq!(json["cleared"], 1);

    call(&app, "GET", "/api/students").await;
    call(&app, "GET", "/timestamps").await;
    assert_eq!(backend.student_hits(), 1);
    assert_eq!(backend.timestamp_hits(), 2);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, _) = create_test_app().await;

    call(&app, "GET", "/timestamps").await;
    call(&app, "GET", "/timestamps?page=2").await;

    let (status, stats) = call(&app, "GET", "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["cache_size"], 1);
    assert_eq!(stats["pending_requests"], 0);
    assert_eq!(stats["request_counts"][endpoint_key("timestamps")], 2);
    assert_eq!(stats["cache_keys"], json!([endpoint_key("timestamps")]));
    assert_eq!(stats["hit_rate"], 0.5);
}

/// Percent-encodes everything outside the unreserved set.
fn urlencode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
