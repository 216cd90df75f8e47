//! Health check and API document handlers

use crate::openapi::ApiDoc;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub models: ModelsInfo,
}

#[derive(Serialize, ToSchema)]
pub struct ModelsInfo {
    pub summarization: SummarizationInfo,
    pub ner: NerInfo,
}

#[derive(Serialize, ToSchema)]
pub struct SummarizationInfo {
    /// Model actually serving requests
    pub model: String,
    /// Whether the fallback model replaced the configured one
    pub fallback: bool,
}

#[derive(Serialize, ToSchema)]
pub struct NerInfo {
    pub model: String,
    /// `remote` or `pattern`
    pub backend: String,
}

/// Liveness probe with the loaded model identifiers
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pipelines = &state.pipelines;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        models: ModelsInfo {
            summarization: SummarizationInfo {
                model: pipelines.summarizer.model_id().to_string(),
                fallback: pipelines.summarizer_is_fallback,
            },
            ner: NerInfo {
                model: pipelines.recognizer.model_id().to_string(),
                backend: pipelines.ner_backend.to_string(),
            },
        },
    })
}

/// OpenAPI document
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
