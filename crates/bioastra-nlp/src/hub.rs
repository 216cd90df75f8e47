//! Model hub and inference API client
//!
//! Resolves model identifiers against the hub (`/api/models/{id}`) and posts
//! inference payloads to `/models/{id}` on the inference API.

use std::time::Duration;

use bioastra_core::{ModelsConfig, NlpError, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Subset of the hub's model metadata used at load time
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    /// Task the model is published for, e.g. `summarization`
    #[serde(default)]
    pub pipeline_tag: Option<String>,
}

/// Error body returned by the inference API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// HTTP client shared by every hub-backed pipeline
#[derive(Debug, Clone)]
pub struct HubClient {
    client: Client,
    hub_url: String,
    inference_url: String,
    api_token: Option<String>,
}

impl HubClient {
    /// Create a new hub client
    pub fn new(hub_url: impl Into<String>, inference_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            hub_url: trim_base(hub_url.into()),
            inference_url: trim_base(inference_url.into()),
            api_token: None,
        }
    }

    /// Create from config
    pub fn from_config(config: &ModelsConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| NlpError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            hub_url: trim_base(config.hub_url.clone()),
            inference_url: trim_base(config.inference_url.clone()),
            api_token: config.api_token.clone(),
        })
    }

    /// Fetch model metadata from the hub
    pub async fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
        let url = format!("{}/api/models/{}", self.hub_url, model_id);

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| NlpError::model_load(model_id, format!("Hub request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::model_load(
                model_id,
                format!("Hub returned {status}: {}", error_message(&body)),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| NlpError::model_load(model_id, format!("Invalid hub metadata: {e}")))
    }

    /// Resolve a model and check that it is published for `expected_task`
    ///
    /// Models without a `pipeline_tag` are accepted as-is.
    pub async fn resolve(&self, model_id: &str, expected_task: &str) -> Result<ModelInfo> {
        let info = self.model_info(model_id).await?;

        match info.pipeline_tag.as_deref() {
            Some(tag) if tag != expected_task => Err(NlpError::model_load(
                model_id,
                format!("model is published for '{tag}', expected '{expected_task}'"),
            )),
            _ => Ok(info),
        }
    }

    /// Run inference against a hosted model
    pub async fn infer<B, R>(&self, model_id: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/models/{}", self.inference_url, model_id);

        let response = self
            .authorized(self.client.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| NlpError::Inference(format!("Request to {model_id} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::Inference(format!(
                "{model_id} returned {status}: {}",
                error_message(&body)
            )));
        }

        response.json().await.map_err(|e| {
            NlpError::InvalidOutput(format!("Failed to parse {model_id} response: {e}"))
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Inference options sent with every request
#[derive(Debug, Serialize)]
pub(crate) struct InferenceOptions {
    /// Block until a cold model is loaded instead of failing with 503
    pub wait_for_model: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            wait_for_model: true,
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_trim_base() {
        let client = HubClient::new("https://huggingface.co/", "http://localhost:8080//");
        assert_eq!(client.hub_url, "https://huggingface.co");
        assert_eq!(client.inference_url, "http://localhost:8080");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":"Model is currently loading","estimated_time":20.0}"#),
            "Model is currently loading"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_resolve_checks_pipeline_tag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/dslim/bert-base-NER"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "dslim/bert-base-NER",
                "pipeline_tag": "token-classification"
            })))
            .mount(&server)
            .await;

        let hub = HubClient::new(server.uri(), server.uri());

        let info = hub
            .resolve("dslim/bert-base-NER", "token-classification")
            .await
            .unwrap();
        assert_eq!(info.id, "dslim/bert-base-NER");

        let err = hub
            .resolve("dslim/bert-base-NER", "summarization")
            .await
            .unwrap_err();
        assert!(matches!(err, NlpError::ModelLoad { .. }));
    }

    #[tokio::test]
    async fn test_model_info_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/nobody/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "Repository not found"})),
            )
            .mount(&server)
            .await;

        let hub = HubClient::new(server.uri(), server.uri());
        let err = hub.model_info("nobody/missing").await.unwrap_err();

        assert!(err.to_string().contains("Repository not found"));
    }

    #[tokio::test]
    async fn test_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/facebook/bart-large-cnn"))
            .and(header("Authorization", "Bearer hf_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "facebook/bart-large-cnn",
                "modelId": "facebook/bart-large-cnn"
            })))
            .mount(&server)
            .await;

        let hub = HubClient::from_config(&ModelsConfig {
            hub_url: server.uri(),
            inference_url: server.uri(),
            api_token: Some("hf_test".to_string()),
            ..ModelsConfig::default()
        })
        .unwrap();
        let info = hub.model_info("facebook/bart-large-cnn").await.unwrap();

        assert_eq!(info.id, "facebook/bart-large-cnn");
        assert!(info.pipeline_tag.is_none());
    }

    #[tokio::test]
    async fn test_configured_timeout_aborts_slow_inference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/facebook/bart-large-cnn"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"summary_text": "late"}]))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let hub = HubClient::from_config(&ModelsConfig {
            hub_url: server.uri(),
            inference_url: server.uri(),
            timeout_secs: Some(1),
            ..ModelsConfig::default()
        })
        .unwrap();

        let err = hub
            .infer::<_, serde_json::Value>("facebook/bart-large-cnn", &serde_json::json!({"inputs": "x"}))
            .await
            .unwrap_err();

        assert!(matches!(err, NlpError::Inference(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_no_timeout_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/facebook/bart-large-cnn"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"summary_text": "late"}]))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let hub = HubClient::from_config(&ModelsConfig {
            hub_url: server.uri(),
            inference_url: server.uri(),
            ..ModelsConfig::default()
        })
        .unwrap();

        let value: serde_json::Value = hub
            .infer("facebook/bart-large-cnn", &serde_json::json!({"inputs": "x"}))
            .await
            .unwrap();

        assert_eq!(value[0]["summary_text"], "late");
    }
}
