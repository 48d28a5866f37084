//! Morbyx — Disease risk-factor extraction engine.
//! Entry point for the agent binary.

mod config;
mod service;

use std::path::Path;

use morbyx_classify::{BertClassifier, ClassifierConfig};
use morbyx_graph::GraphClient;
use morbyx_qa::{BertReader, QaConfig, ReaderConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use service::RiskFactorService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("morbyx=debug,info")),
        )
        .init();

    info!("Morbyx starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match config::Config::load() {
        Ok(c) => {
            info!("Configuration loaded. Graph endpoint: {}", c.graph.endpoint);
            c
        }
        Err(e) => {
            tracing::warn!("Could not load morbyx.toml: {e}");
            tracing::warn!("Copy morbyx.example.toml to morbyx.toml and edit it.");
            return Ok(());
        }
    };

    let graph = GraphClient::new(config.graph.endpoint.clone(), config.graph.auth_token.clone())?;

    let mut classifier_config = match &config.models.classifier_dir {
        Some(dir) => ClassifierConfig::from_dir(dir),
        None => ClassifierConfig::default(),
    };
    classifier_config.use_gpu = config.models.use_gpu;
    let classifier = BertClassifier::new(classifier_config).await?;

    let mut reader_config = match &config.models.reader_dir {
        Some(dir) => ReaderConfig::from_dir(dir),
        None => ReaderConfig::default(),
    };
    reader_config.use_gpu = config.models.use_gpu;
    let reader = BertReader::new(reader_config).await?;

    let mut qa_config = QaConfig::default();
    if let Some(dir) = &config.models.reader_dir {
        qa_config = qa_config.load_max_answer_length(Path::new(dir))?;
        info!(
            max_answer_length = qa_config.max_answer_length,
            "loaded answer-length sidecar"
        );
    }

    let service = RiskFactorService::new(
        graph,
        classifier,
        reader,
        qa_config,
        config.search.max_articles,
    );
    service.evaluate_all().await?;

    info!("Morbyx run complete.");
    Ok(())
}
