use thiserror::Error;

#[derive(Debug, Error)]
pub enum MorbyxError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph API error: {0}")]
    Graph(String),

    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Article fetch exhausted after {attempts} attempts: {article_id}")]
    ArticleFetchExhausted { article_id: String, attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MorbyxError>;
