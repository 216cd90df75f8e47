//! BioAstra Configuration Management
//!
//! Handles configuration from a TOML file and environment variables, with
//! defaults that reproduce the service's stock behavior (port 8001, BART
//! summarizer with a DistilBART fallback, hub-hosted NER model).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Model hub and pipeline configuration
    pub models: ModelsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Defaults, then the optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_override()
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Models
        if let Some(url) = lookup("HF_HUB_URL") {
            self.models.hub_url = url;
        }
        if let Some(url) = lookup("HF_INFERENCE_URL") {
            self.models.inference_url = url;
        }
        if let Some(token) = lookup("HF_API_TOKEN") {
            self.models.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(model) = lookup("SUMMARIZATION_MODEL") {
            self.models.summarization_model = model;
        }
        if let Some(model) = lookup("SUMMARIZATION_FALLBACK_MODEL") {
            self.models.summarization_fallback_model = model;
        }
        if let Some(model) = lookup("NER_MODEL") {
            self.models.ner_model = model;
        }
        if let Some(backend) = lookup("NER_BACKEND") {
            self.models.ner_backend = backend.parse()?;
        }
        if let Some(secs) = lookup("MODEL_TIMEOUT_SECS") {
            self.models.timeout_secs = Some(parse_value("MODEL_TIMEOUT_SECS", secs)?);
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = parse_value("LOG_JSON", json)?;
        }

        Ok(self)
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS (empty allows any origin)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            max_body_size: 2 * 1024 * 1024, // 2MB
            cors_enabled: true,
            cors_origins: vec![],
        }
    }
}

/// Model hub and pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Model hub base URL, used to resolve model identifiers at startup
    pub hub_url: String,

    /// Inference API base URL
    pub inference_url: String,

    /// Bearer token for the hub and inference API
    pub api_token: Option<String>,

    /// Primary summarization model
    pub summarization_model: String,

    /// Model loaded when the primary summarization model is unavailable
    pub summarization_fallback_model: String,

    /// Named entity recognition model (remote backend only)
    pub ner_model: String,

    /// Which entity recognizer to run
    pub ner_backend: NerBackend,

    /// Timeout for outbound model calls; none means wait indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            hub_url: "https://huggingface.co".to_string(),
            inference_url: "https://api-inference.huggingface.co".to_string(),
            api_token: None,
            summarization_model: "facebook/bart-large-cnn".to_string(),
            summarization_fallback_model: "sshleifer/distilbart-cnn-12-6".to_string(),
            ner_model: "dslim/bert-base-NER".to_string(),
            ner_backend: NerBackend::Remote,
            timeout_secs: None,
        }
    }
}

/// Entity recognizer backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NerBackend {
    /// Token-classification model served by the inference API
    Remote,
    /// Built-in pattern and dictionary recognizer
    Pattern,
}

impl NerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Pattern => "pattern",
        }
    }
}

impl std::fmt::Display for NerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "pattern" => Ok(Self::Pattern),
            _ => Err(ConfigError::InvalidValue {
                key: "NER_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.bind_addr(), "0.0.0.0:8001");
        assert_eq!(config.models.summarization_model, "facebook/bart-large-cnn");
        assert_eq!(config.models.ner_backend, NerBackend::Remote);
        assert!(config.models.timeout_secs.is_none());
    }

    #[test]
    fn test_ner_backend_parse() {
        assert_eq!("remote".parse::<NerBackend>().unwrap(), NerBackend::Remote);
        assert_eq!(" Pattern ".parse::<NerBackend>().unwrap(), NerBackend::Pattern);
        assert!("spacy".parse::<NerBackend>().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default()
            .apply_overrides(lookup_from(&[
                ("API_PORT", "9000"),
                ("NER_BACKEND", "pattern"),
                ("SUMMARIZATION_MODEL", "google/pegasus-xsum"),
                ("MODEL_TIMEOUT_SECS", "30"),
                ("CORS_ORIGINS", "http://localhost:3000, ,http://localhost:5000"),
                ("LOG_JSON", "true"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.models.ner_backend, NerBackend::Pattern);
        assert_eq!(config.models.summarization_model, "google/pegasus-xsum");
        assert_eq!(config.models.timeout_secs, Some(30));
        assert_eq!(config.server.cors_origins.len(), 2);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = AppConfig::default()
            .apply_overrides(lookup_from(&[("API_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "API_PORT"));
    }

    #[test]
    fn test_empty_token_is_none() {
        let config = AppConfig::default()
            .apply_overrides(lookup_from(&[("HF_API_TOKEN", "")]))
            .unwrap();
        assert!(config.models.api_token.is_none());
    }

    #[test]
    fn test_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 8100\n\n[models]\nner_backend = \"pattern\"\n"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.models.ner_backend, NerBackend::Pattern);
        assert_eq!(
            config.models.summarization_fallback_model,
            "sshleifer/distilbart-cnn-12-6"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/bioastra.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
