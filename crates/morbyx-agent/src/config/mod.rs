//! Configuration loading for Morbyx.
//! Reads morbyx.toml from the current directory or the path in the
//! MORBYX_CONFIG env var.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub graph: GraphConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// GraphQL endpoint of the disease knowledge graph.
    pub endpoint: String,
    /// Bearer token; falls back to the MORBYX_GRAPH_TOKEN env var.
    pub auth_token: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory with the fine-tuned relevance classifier. Hub weights are
    /// used when unset.
    pub classifier_dir: Option<String>,
    /// Directory with the fine-tuned QA reader and its
    /// max_answer_length.json sidecar.
    pub reader_dir: Option<String>,
    #[serde(default = "bool_true")]
    pub use_gpu: bool,
}

fn bool_true() -> bool { true }

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            classifier_dir: None,
            reader_dir: None,
            use_gpu: bool_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
}

fn default_max_articles() -> usize { 1000 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_articles: default_max_articles() }
    }
}

mod tests;

impl Config {
    /// Load configuration from morbyx.toml.
    /// Checks MORBYX_CONFIG env var first, then the current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("MORBYX_CONFIG")
            .unwrap_or_else(|_| "morbyx.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy morbyx.example.toml to morbyx.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        if config.graph.auth_token.is_none() {
            if let Ok(token) = std::env::var("MORBYX_GRAPH_TOKEN") {
                config.graph.auth_token = Some(SecretString::from(token));
            }
        }
        Ok(config)
    }
}
