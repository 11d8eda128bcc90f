//! HTTP endpoint tests driven through the router with `tower::ServiceExt`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use counter::{CounterConfig, CounterService};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::http::routes;
use sharding::{CounterStore, MemoryStore, ShardId, ShardRouter};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, Arc<CounterService>) {
    let router = ShardRouter::connect(["memory://a"], 100).unwrap();
    let service = Arc::new(CounterService::new(Arc::new(router), CounterConfig::default()));
    (routes(Arc::clone(&service)), service)
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_post_visit_returns_buffered_count() {
    let (app, service) = app();

    let (status, body) = send(app.clone(), "POST", "/visit/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"visits": 1, "served_via": "in_memory"}));

    let (_, body) = send(app, "POST", "/visit/p1").await;
    assert_eq!(body["visits"], 2);
    assert_eq!(service.buffered("p1"), 2);
}

#[tokio::test]
async fn test_get_visits_reads_shard_then_cache() {
    let (app, _service) = app();
    for _ in 0..3 {
        send(app.clone(), "POST", "/visit/p1").await;
    }

    let (status, body) = send(app.clone(), "GET", "/visits/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"visits": 3, "served_via": "shard:memory://a"}));

    let (_, body) = send(app, "GET", "/visits/p1").await;
    assert_eq!(body, json!({"visits": 3, "served_via": "in_memory"}));
}

#[tokio::test]
async fn test_get_visits_unknown_page_is_zero() {
    let (app, _service) = app();
    let (status, body) = send(app, "GET", "/visits/never-seen").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["visits"], 0);
    assert_eq!(body["served_via"], "shard:memory://a");
}

#[tokio::test]
async fn test_get_visits_degraded_when_shard_down() {
    let store = Arc::new(MemoryStore::new("memory://down"));
    store.set_unavailable(true);
    let router = ShardRouter::from_stores(
        vec![(ShardId::new("memory://down"), Arc::clone(&store) as Arc<dyn CounterStore>)],
        100,
    )
    .unwrap();
    let service = Arc::new(CounterService::new(Arc::new(router), CounterConfig::default()));
    let app = routes(Arc::clone(&service));

    let (_, body) = send(app.clone(), "POST", "/visit/p1").await;
    assert_eq!(body["visits"], 1, "Writes succeed while the shard is down");

    let (status, body) = send(app, "GET", "/visits/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"visits": 0, "served_via": "error"}));
}

#[tokio::test]
async fn test_health_lists_shards_and_pending() {
    let (app, _service) = app();
    send(app.clone(), "POST", "/visit/p1").await;
    send(app.clone(), "POST", "/visit/p2").await;

    let (status, body) = send(app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["shards"], json!(["memory://a"]));
    assert_eq!(body["pending_visits"], 2);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (app, _service) = app();
    let (status, body) = send(app, "GET", "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let (app, _service) = app();
    let request = Request::builder()
        .method("GET")
        .uri("/visit/p1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
