//! BioAstra API Server
//!
//! Loads the summarization and NER pipelines, then serves them over HTTP.

use anyhow::Context;
use bioastra_api::{create_router, state::AppState};
use bioastra_core::{AppConfig, LoggingConfig};
use bioastra_nlp::ModelLoader;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bioastra-api")]
#[command(author, version, about = "BioAstra NLP microservice", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!(
        bind = %config.bind_addr(),
        summarization_model = %config.models.summarization_model,
        fallback_model = %config.models.summarization_fallback_model,
        ner_model = %config.models.ner_model,
        ner_backend = %config.models.ner_backend,
        "Configuration loaded"
    );

    // Model load failures abort startup; the summarizer may fall back first
    let pipelines = ModelLoader::from_config(&config.models)?
        .load_all()
        .await
        .context("Failed to load model pipelines")?;

    if pipelines.summarizer_is_fallback {
        tracing::warn!(
            model = pipelines.summarizer.model_id(),
            "Serving summaries with the fallback model"
        );
    }

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, pipelines));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("BioAstra API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let level = &logging.level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bioastra_api={level},bioastra_nlp={level},tower_http={level}").into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
