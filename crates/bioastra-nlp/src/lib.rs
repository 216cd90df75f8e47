//! BioAstra NLP - model pipelines
//!
//! Wraps pretrained models behind two callables used by the HTTP layer:
//! abstractive summarization and named entity recognition. Models are
//! resolved by identifier against a model hub at startup and invoked through
//! an inference API; an offline pattern recognizer is also available.

use async_trait::async_trait;
use bioastra_core::Result;

/// Entity detected in a piece of text
///
/// `start` and `end` are character offsets (not bytes) into the input text,
/// end exclusive, so that `text` equals the characters `start..end`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Length bounds forwarded to the summarization model
///
/// Values are passed through untouched; the model decides what to do with
/// negative or inverted bounds. `None` leaves the bound to the model's own
/// generation config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
}

impl GenerationParams {
    pub const DEFAULT_MIN_LENGTH: i64 = 50;
    pub const DEFAULT_MAX_LENGTH: i64 = 150;
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            min_length: Some(Self::DEFAULT_MIN_LENGTH),
            max_length: Some(Self::DEFAULT_MAX_LENGTH),
        }
    }
}

/// Trait for summarization pipelines
///
/// Implementations must generate greedily (no sampling) so that the same
/// input always yields the same summary for a fixed model.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, params: GenerationParams) -> Result<String>;

    /// Identifier of the model behind this pipeline
    fn model_id(&self) -> &str;
}

/// Trait for named entity recognition pipelines
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Detect entities, in the order the model reports them
    async fn recognize(&self, text: &str) -> Result<Vec<ExtractedEntity>>;

    fn model_id(&self) -> &str;
}

pub mod hub;
pub mod loader;
pub mod ner;
pub mod summarize;

pub use hub::{HubClient, ModelInfo};
pub use loader::{Loaded, ModelLoader, Pipelines};
pub use ner::{HfEntityRecognizer, PatternNer};
pub use summarize::HfSummarizer;
