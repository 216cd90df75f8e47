//! BioAstra Core - shared error type and configuration
//!
//! This crate defines the pieces used by both the pipeline crate and the
//! HTTP server:
//! - The service-wide error type and `Result` alias
//! - Configuration management (defaults, TOML file, environment)

pub mod config;

pub use config::{AppConfig, ConfigError, LoggingConfig, ModelsConfig, NerBackend, ServerConfig};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error type for model loading and inference
#[derive(Error, Debug)]
pub enum NlpError {
    /// A model could not be resolved or prepared for inference
    #[error("Failed to load model {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    /// The inference call itself failed (transport, upstream status, ...)
    #[error("Inference error: {0}")]
    Inference(String),

    /// The model answered, but with output that violates the response contract
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NlpError {
    /// Build a model load error
    pub fn model_load(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error happened while serving a request (as opposed to startup)
    pub fn is_inference_failure(&self) -> bool {
        matches!(self, Self::Inference(_) | Self::InvalidOutput(_))
    }
}

pub type Result<T> = std::result::Result<T, NlpError>;
