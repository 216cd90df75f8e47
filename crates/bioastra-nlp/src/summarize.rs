//! Abstractive summarization backed by a hosted seq2seq model

use async_trait::async_trait;
use bioastra_core::{NlpError, Result};
use serde::{Deserialize, Serialize};

use crate::hub::{HubClient, InferenceOptions};
use crate::{GenerationParams, Summarizer};

/// Hub task tag for summarization models
pub const SUMMARIZATION_TASK: &str = "summarization";

#[derive(Debug, Serialize)]
struct SummarizationRequest<'a> {
    inputs: &'a str,
    parameters: SummarizationParameters,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct SummarizationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    min_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<i64>,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct SummarizationOutput {
    summary_text: String,
}

/// Summarizer calling a model hosted on the inference API
pub struct HfSummarizer {
    hub: HubClient,
    model: String,
}

impl HfSummarizer {
    /// Wrap an already-resolved model
    pub fn new(hub: HubClient, model: impl Into<String>) -> Self {
        Self {
            hub,
            model: model.into(),
        }
    }

    /// Resolve `model` on the hub and build a summarizer for it
    pub async fn load(hub: HubClient, model: &str) -> Result<Self> {
        let info = hub.resolve(model, SUMMARIZATION_TASK).await?;
        Ok(Self::new(hub, info.id))
    }
}

#[async_trait]
impl Summarizer for HfSummarizer {
    async fn summarize(&self, text: &str, params: GenerationParams) -> Result<String> {
        let request = SummarizationRequest {
            inputs: text,
            parameters: SummarizationParameters {
                min_length: params.min_length,
                max_length: params.max_length,
                do_sample: false,
            },
            options: InferenceOptions::default(),
        };

        let outputs: Vec<SummarizationOutput> = self.hub.infer(&self.model, &request).await?;

        let summary = outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| NlpError::InvalidOutput("No summary generated".to_string()))?;

        // Non-empty input must produce a non-empty summary
        if summary.trim().is_empty() && !text.trim().is_empty() {
            return Err(NlpError::InvalidOutput(format!(
                "{} returned an empty summary",
                self.model
            )));
        }

        Ok(summary)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
