// src/api.rs
use std::any::Any;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{extract::State, routing::get, Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::cache::NewsCache;
use crate::ingest::types::AggregationResult;
use crate::ingest::Aggregator;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub cache: Arc<NewsCache>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", get(news))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// The single read-only endpoint: cached-or-fresh aggregation as JSON.
/// Upstream failures never reach this layer; they degrade to fewer articles.
async fn news(State(state): State<AppState>) -> Json<Arc<AggregationResult>> {
    let result = state.cache.get_or_refresh(&state.aggregator).await;
    Json(result)
}

// Programming errors (a panicking handler) are the only path that surfaces
// an error envelope to the API consumer.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%details, "news handler panicked");
    let body = serde_json::json!({
        "error": "Failed to fetch news",
        "details": details,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
