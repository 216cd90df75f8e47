//! Request and response schemas
//!
//! Every schema is built per request from pipeline output and dropped once
//! the response is written.

use bioastra_nlp::{ExtractedEntity, GenerationParams};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Input
// ============================================================================

/// Text sent to the summarizer or the entity extractor
///
/// Length bounds are only read by `/summarize`. They are forwarded as given;
/// an explicit `null` leaves the bound to the model's defaults.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TextInput {
    /// Source text, passed to the model unmodified
    #[schema(example = "Microgravity affects plant growth in the ISS.")]
    pub text: String,

    /// Minimum summary length in tokens
    #[serde(default = "default_min_length")]
    #[schema(default = 50, example = 50)]
    pub min_length: Option<i64>,

    /// Maximum summary length in tokens
    #[serde(default = "default_max_length")]
    #[schema(default = 150, example = 150)]
    pub max_length: Option<i64>,
}

fn default_min_length() -> Option<i64> {
    Some(GenerationParams::DEFAULT_MIN_LENGTH)
}

fn default_max_length() -> Option<i64> {
    Some(GenerationParams::DEFAULT_MAX_LENGTH)
}

impl TextInput {
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            min_length: self.min_length,
            max_length: self.max_length,
        }
    }
}

// ============================================================================
// Summarization output
// ============================================================================

/// Response of the summarization endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryOut {
    /// Generated summary
    #[schema(example = "Microgravity alters plant growth aboard the ISS.")]
    pub summary: String,
}

// ============================================================================
// Entity extraction output
// ============================================================================

/// A single extracted entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Entity {
    /// Entity text, identical to `text[start_char..end_char]` of the input
    #[schema(example = "ISS")]
    pub text: String,

    /// Category assigned by the model
    #[schema(example = "FAC")]
    pub label: String,

    /// Character offset of the first character
    #[schema(example = 41)]
    pub start_char: usize,

    /// Character offset one past the last character
    #[schema(example = 44)]
    pub end_char: usize,
}

impl From<ExtractedEntity> for Entity {
    fn from(entity: ExtractedEntity) -> Self {
        Self {
            text: entity.text,
            label: entity.label,
            start_char: entity.start,
            end_char: entity.end,
        }
    }
}

/// Response of the entity extraction endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntitiesOut {
    /// Entities in the order the model reported them
    pub entities: Vec<Entity>,
}

// ============================================================================
// Relation extraction output (reserved)
// ============================================================================

/// Relationship between two entities, as stored in the knowledge graph
///
/// Published in the API document only; no endpoint produces it yet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Relation {
    #[schema(example = "Microgravity")]
    pub subject: String,

    #[schema(example = "INFLUENCES")]
    pub relation: String,

    #[schema(example = "plant growth")]
    pub object: String,
}

/// Response schema reserved for relation extraction
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RelationsOut {
    pub relations: Vec<Relation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_input_defaults() {
        let input: TextInput = serde_json::from_value(json!({"text": "abc"})).unwrap();
        assert_eq!(input.min_length, Some(50));
        assert_eq!(input.max_length, Some(150));
        assert_eq!(input.generation_params(), GenerationParams::default());
    }

    #[test]
    fn test_text_input_bounds_not_validated() {
        let input: TextInput =
            serde_json::from_value(json!({"text": "abc", "min_length": 200, "max_length": -1}))
                .unwrap();
        assert_eq!(input.min_length, Some(200));
        assert_eq!(input.max_length, Some(-1));
    }

    #[test]
    fn test_text_input_null_bound() {
        let input: TextInput =
            serde_json::from_value(json!({"text": "abc", "min_length": null})).unwrap();
        assert_eq!(input.min_length, None);
        assert_eq!(input.max_length, Some(150));
    }

    #[test]
    fn test_text_input_requires_text() {
        assert!(serde_json::from_value::<TextInput>(json!({"min_length": 10})).is_err());
        assert!(serde_json::from_value::<TextInput>(json!({"text": 42})).is_err());
    }

    #[test]
    fn test_entity_from_extracted() {
        let entity: Entity = ExtractedEntity {
            text: "NASA".to_string(),
            label: "ORG".to_string(),
            start: 0,
            end: 4,
            confidence: 0.95,
        }
        .into();

        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({"text": "NASA", "label": "ORG", "start_char": 0, "end_char": 4})
        );
    }
}
