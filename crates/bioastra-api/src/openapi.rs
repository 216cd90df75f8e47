//! OpenAPI document

use utoipa::OpenApi;

use crate::error::ApiError;
use crate::handlers::{health, nlp};
use crate::schemas::{EntitiesOut, Entity, Relation, RelationsOut, SummaryOut, TextInput};

/// BioAstra NLP API
///
/// `Relation` and `RelationsOut` are published for knowledge graph clients
/// even though no route returns them yet.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BioAstra NLP API",
        description = "Summarization and named entity extraction for space biology literature"
    ),
    paths(
        nlp::summarize,
        nlp::extract_entities,
        health::health_check,
    ),
    components(schemas(
        TextInput,
        SummaryOut,
        Entity,
        EntitiesOut,
        Relation,
        RelationsOut,
        ApiError,
        health::HealthResponse,
        health::ModelsInfo,
        health::SummarizationInfo,
        health::NerInfo,
    )),
    tags(
        (name = "nlp", description = "Model pipelines"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;
