//! Extractive question answering over article batches.
//!
//! Turns per-token start/end confidence scores into a deduplicated,
//! confidence-ranked set of risk factors:
//!
//! 1. span extraction per article ([`span`])
//! 2. cross-document aggregation ([`aggregate`])
//! 3. threshold + containment consolidation ([`consolidate`])
//!
//! The reader model itself ([`reader`]) is a BERT QA head run through
//! Candle; the pipeline only depends on it through the [`ReaderModel`]
//! trait.

pub mod aggregate;
pub mod config;
pub mod consolidate;
pub mod extractor;
pub mod reader;
pub mod span;

pub use aggregate::{aggregate, fold_article, AggregatedAnswer, ArticleEvidence};
pub use config::QaConfig;
pub use consolidate::consolidate;
pub use extractor::RiskFactorExtractor;
pub use reader::{BertReader, ReaderConfig, ReaderModel, TokenScores};
pub use span::{extract_candidates, CandidateSpan};

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Offset mapping violates the context bounds: {0}")]
    InvalidOffsets(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<candle_core::Error> for QaError {
    fn from(e: candle_core::Error) -> Self {
        QaError::Inference(e.to_string())
    }
}

impl From<std::io::Error> for QaError {
    fn from(e: std::io::Error) -> Self {
        QaError::Download(e.to_string())
    }
}
