use crate::error::RelayError;
use crate::provider::GenerationProvider;
use crate::relay::chat;
use crate::request_id::inject_request_id;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

/// Built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn GenerationProvider>,
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(inject_request_id))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    RelayError::Unexpected(anyhow::anyhow!("Request handler panicked: {}", detail)).into_response()
}
