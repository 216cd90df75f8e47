//! Model loader
//!
//! Builds the two pipelines once, before the server accepts traffic. The
//! summarizer degrades to a fallback model when the primary cannot be loaded;
//! the entity recognizer has no fallback.

use std::sync::Arc;

use bioastra_core::{ModelsConfig, NerBackend, NlpError, Result};

use crate::hub::HubClient;
use crate::ner::{HfEntityRecognizer, PatternNer};
use crate::summarize::HfSummarizer;
use crate::{EntityRecognizer, Summarizer};

/// Outcome of a load that may have fallen back to a secondary model
#[derive(Debug)]
pub enum Loaded<T> {
    Primary(T),
    Fallback {
        pipeline: T,
        /// Why the primary model was rejected
        primary_error: NlpError,
    },
}

impl<T> Loaded<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn pipeline(&self) -> &T {
        match self {
            Self::Primary(pipeline) | Self::Fallback { pipeline, .. } => pipeline,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Primary(pipeline) | Self::Fallback { pipeline, .. } => pipeline,
        }
    }
}

/// Ready-to-use pipelines shared by every request
#[derive(Clone)]
pub struct Pipelines {
    pub summarizer: Arc<dyn Summarizer>,
    /// Whether `summarizer` is the fallback model
    pub summarizer_is_fallback: bool,
    pub recognizer: Arc<dyn EntityRecognizer>,
    pub ner_backend: NerBackend,
}

impl std::fmt::Debug for Pipelines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipelines")
            .field("summarizer", &self.summarizer.model_id())
            .field("summarizer_is_fallback", &self.summarizer_is_fallback)
            .field("recognizer", &self.recognizer.model_id())
            .field("ner_backend", &self.ner_backend)
            .finish()
    }
}

/// Loads pipelines from the model hub
pub struct ModelLoader {
    hub: HubClient,
    config: ModelsConfig,
}

impl ModelLoader {
    /// Create a new loader
    pub fn new(hub: HubClient, config: ModelsConfig) -> Self {
        Self { hub, config }
    }

    /// Create from config
    pub fn from_config(config: &ModelsConfig) -> Result<Self> {
        Ok(Self::new(HubClient::from_config(config)?, config.clone()))
    }

    /// Load a summarization pipeline by model identifier
    pub async fn load_summarizer(&self, model: &str) -> Result<Arc<dyn Summarizer>> {
        let summarizer = HfSummarizer::load(self.hub.clone(), model).await?;
        tracing::info!(model = summarizer.model_id(), "Summarization model loaded");
        Ok(Arc::new(summarizer))
    }

    /// Load the configured summarizer, falling back to the secondary model
    ///
    /// Fails only when both models fail to load.
    pub async fn load_summarizer_with_fallback(&self) -> Result<Loaded<Arc<dyn Summarizer>>> {
        let primary = &self.config.summarization_model;
        let fallback = &self.config.summarization_fallback_model;

        let primary_error = match self.load_summarizer(primary).await {
            Ok(summarizer) => return Ok(Loaded::Primary(summarizer)),
            Err(e) => e,
        };

        tracing::warn!(
            model = %primary,
            error = %primary_error,
            fallback = %fallback,
            "Failed to load summarization model, using fallback"
        );

        if fallback == primary {
            return Err(primary_error);
        }

        match self.load_summarizer(fallback).await {
            Ok(pipeline) => Ok(Loaded::Fallback {
                pipeline,
                primary_error,
            }),
            Err(e) => Err(NlpError::model_load(
                fallback.as_str(),
                format!("{e} (primary {primary} also failed: {primary_error})"),
            )),
        }
    }

    /// Load the configured entity recognizer; no fallback
    pub async fn load_recognizer(&self) -> Result<Arc<dyn EntityRecognizer>> {
        let recognizer: Arc<dyn EntityRecognizer> = match self.config.ner_backend {
            NerBackend::Remote => {
                Arc::new(HfEntityRecognizer::load(self.hub.clone(), &self.config.ner_model).await?)
            }
            NerBackend::Pattern => Arc::new(PatternNer::new()),
        };

        tracing::info!(
            model = recognizer.model_id(),
            backend = %self.config.ner_backend,
            "NER model loaded"
        );
        Ok(recognizer)
    }

    /// Load both pipelines
    pub async fn load_all(&self) -> Result<Pipelines> {
        let summarizer = self.load_summarizer_with_fallback().await?;
        let recognizer = self.load_recognizer().await?;

        Ok(Pipelines {
            summarizer_is_fallback: summarizer.is_fallback(),
            summarizer: summarizer.into_inner(),
            recognizer,
            ner_backend: self.config.ner_backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_model(server: &MockServer, id: &str, task: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/api/models/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": id,
                "pipeline_tag": task
            })))
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer) -> ModelsConfig {
        ModelsConfig {
            hub_url: server.uri(),
            inference_url: server.uri(),
            ..ModelsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_primary_summarizer_loaded() {
        let server = MockServer::start().await;
        mount_model(&server, "facebook/bart-large-cnn", "summarization").await;

        let loader = ModelLoader::from_config(&config_for(&server)).unwrap();
        let loaded = loader.load_summarizer_with_fallback().await.unwrap();

        assert!(!loaded.is_fallback());
        assert_eq!(loaded.pipeline().model_id(), "facebook/bart-large-cnn");
    }

    #[tokio::test]
    async fn test_fallback_summarizer_when_primary_missing() {
        let server = MockServer::start().await;
        mount_model(&server, "sshleifer/distilbart-cnn-12-6", "summarization").await;

        let loader = ModelLoader::from_config(&config_for(&server)).unwrap();
        let loaded = loader.load_summarizer_with_fallback().await.unwrap();

        match loaded {
            Loaded::Fallback {
                pipeline,
                primary_error,
            } => {
                assert_eq!(pipeline.model_id(), "sshleifer/distilbart-cnn-12-6");
                assert!(primary_error.to_string().contains("facebook/bart-large-cnn"));
            }
            Loaded::Primary(_) => panic!("expected fallback"),
        }
    }

    #[tokio::test]
    async fn test_fallback_when_primary_has_wrong_task() {
        let server = MockServer::start().await;
        mount_model(&server, "facebook/bart-large-cnn", "fill-mask").await;
        mount_model(&server, "sshleifer/distilbart-cnn-12-6", "summarization").await;

        let loader = ModelLoader::from_config(&config_for(&server)).unwrap();
        let loaded = loader.load_summarizer_with_fallback().await.unwrap();

        assert!(loaded.is_fallback());
    }

    #[tokio::test]
    async fn test_both_summarizers_missing_is_fatal() {
        let server = MockServer::start().await;

        let loader = ModelLoader::from_config(&config_for(&server)).unwrap();
        let Err(err) = loader.load_summarizer_with_fallback().await else {
            panic!("expected both loads to fail");
        };

        match err {
            NlpError::ModelLoad { model, reason } => {
                assert_eq!(model, "sshleifer/distilbart-cnn-12-6");
                assert!(reason.contains("facebook/bart-large-cnn"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fallback_equal_to_primary_is_not_retried() {
        let server = MockServer::start().await;

        let config = ModelsConfig {
            summarization_fallback_model: "facebook/bart-large-cnn".to_string(),
            ..config_for(&server)
        };
        let loader = ModelLoader::from_config(&config).unwrap();
        let Err(err) = loader.load_summarizer_with_fallback().await else {
            panic!("expected the load to fail");
        };

        match err {
            NlpError::ModelLoad { model, reason } => {
                assert_eq!(model, "facebook/bart-large-cnn");
                assert!(!reason.contains("also failed"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_recognizer_load_failure_is_fatal() {
        let server = MockServer::start().await;
        mount_model(&server, "facebook/bart-large-cnn", "summarization").await;

        let loader = ModelLoader::from_config(&config_for(&server)).unwrap();
        let err = loader.load_all().await.unwrap_err();

        assert!(matches!(err, NlpError::ModelLoad { ref model, .. } if model == "dslim/bert-base-NER"));
    }

    #[tokio::test]
    async fn test_pattern_backend_needs_no_hub() {
        let server = MockServer::start().await;
        mount_model(&server, "facebook/bart-large-cnn", "summarization").await;

        let config = ModelsConfig {
            ner_backend: NerBackend::Pattern,
            ..config_for(&server)
        };
        let pipelines = ModelLoader::from_config(&config)
            .unwrap()
            .load_all()
            .await
            .unwrap();

        assert!(!pipelines.summarizer_is_fallback);
        assert_eq!(pipelines.ner_backend, NerBackend::Pattern);
        assert_eq!(pipelines.recognizer.model_id(), crate::ner::PATTERN_MODEL_ID);
    }
}
