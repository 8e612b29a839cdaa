use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

pub fn root_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(handlers::health::welcome))
}

// API Routes - chat endpoint and service status
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            .route("/chat", post(handlers::api::chat))
            .route("/status", get(handlers::api::system_status)),
    )
}
