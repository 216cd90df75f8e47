//! API route definitions

use crate::handlers::{health, nlp};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Model pipeline routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/summarize", post(nlp::summarize))
        .route("/extract-entities", post(nlp::extract_entities))
}

/// Service status routes
pub fn status_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/openapi.json", get(health::openapi_json))
}
