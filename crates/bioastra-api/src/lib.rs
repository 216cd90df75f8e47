//! BioAstra API - HTTP server for the NLP pipelines
//!
//! Exposes `POST /summarize` and `POST /extract-entities` over the
//! pipelines built at startup, plus `/health` and `/openapi.json`.

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod schemas;
pub mod state;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use bioastra_core::ServerConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router with its middleware stack
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = state.config.server.clone();

    let mut router = Router::new()
        .merge(routes::api_routes())
        .merge(routes::status_routes())
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TraceLayer::new_for_http());

    if server.cors_enabled {
        router = router.layer(cors_layer(&server));
    }

    router.with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if server.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
