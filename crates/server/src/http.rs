//! HTTP surface: two counter endpoints and a health check.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use counter::{CounterService, VisitCount};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CounterService>,
}

/// Build the application router.
pub fn routes(service: Arc<CounterService>) -> Router {
    tracing::debug!("Building routes");

    Router::new()
        .route("/visit/:page_id", post(increment_visit))
        .route("/visits/:page_id", get(get_visit_count))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(AppState { service })
}

/// POST /visit/{page_id} - record a visit, answer with the buffered count
async fn increment_visit(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Json<VisitCount> {
    Json(VisitCount::in_memory(state.service.increment_visit(&page_id)))
}

/// GET /visits/{page_id} - current count
///
/// `{"visits": 0, "served_via": "error"}` means the owning shard could not be
/// read; it is a degraded-service signal, not a real zero.
async fn get_visit_count(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Json<VisitCount> {
    Json(state.service.get_visit_count(&page_id).await)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let shards: Vec<String> = state
        .service
        .router()
        .shards()
        .iter()
        .map(|s| s.to_string())
        .collect();
    Json(json!({
        "status": "ok",
        "shards": shards,
        "pending_visits": state.service.pending_visits(),
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".into())
}

/// Turn a handler panic into a 500 instead of tearing down the connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(detail).into_response()
}
