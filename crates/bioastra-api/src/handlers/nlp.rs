//! Summarization and entity extraction handlers

use crate::error::{ApiError, AppError};
use crate::schemas::{EntitiesOut, Entity, SummaryOut, TextInput};
use crate::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

/// Summarize a text
///
/// Runs the loaded summarization model on `text`. Generation is greedy, so
/// repeated calls with the same input return the same summary.
#[utoipa::path(
    post,
    path = "/summarize",
    tag = "nlp",
    request_body = TextInput,
    responses(
        (status = 200, description = "Summary generated", body = SummaryOut),
        (status = 400, description = "Malformed JSON body", body = ApiError),
        (status = 422, description = "Body does not match the input schema", body = ApiError),
        (status = 500, description = "Model inference failed", body = ApiError)
    )
)]
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TextInput>, JsonRejection>,
) -> Result<Json<SummaryOut>, AppError> {
    let Json(input) = payload?;
    let params = input.generation_params();

    tracing::debug!(
        chars = input.text.chars().count(),
        min_length = ?params.min_length,
        max_length = ?params.max_length,
        "Summarize request"
    );

    let summary = state
        .pipelines
        .summarizer
        .summarize(&input.text, params)
        .await?;

    Ok(Json(SummaryOut { summary }))
}

/// Extract named entities from a text
///
/// `min_length` and `max_length` are accepted and ignored.
#[utoipa::path(
    post,
    path = "/extract-entities",
    tag = "nlp",
    request_body = TextInput,
    responses(
        (status = 200, description = "Entities extracted", body = EntitiesOut),
        (status = 400, description = "Malformed JSON body", body = ApiError),
        (status = 422, description = "Body does not match the input schema", body = ApiError),
        (status = 500, description = "Model inference failed", body = ApiError)
    )
)]
pub async fn extract_entities(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TextInput>, JsonRejection>,
) -> Result<Json<EntitiesOut>, AppError> {
    let Json(input) = payload?;

    let entities = state.pipelines.recognizer.recognize(&input.text).await?;

    tracing::debug!(count = entities.len(), "Entities extracted");

    Ok(Json(EntitiesOut {
        entities: entities.into_iter().map(Entity::from).collect(),
    }))
}
