//! Binary relevance classification of articles.
//!
//! Stage one of the risk-factor pipeline: a fine-tuned BERT sequence
//! classifier decides per article whether it discusses risk factors at
//! all; only relevant articles reach the QA reader.

pub mod model;
pub mod stage;

pub use model::{BertClassifier, ClassifierConfig, RelevanceModel};
pub use stage::RelevanceStage;

pub type Result<T> = std::result::Result<T, ClassifyError>;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Download failed: {0}")]
    Download(String),
}

impl From<candle_core::Error> for ClassifyError {
    fn from(e: candle_core::Error) -> Self {
        ClassifyError::Inference(e.to_string())
    }
}

impl From<std::io::Error> for ClassifyError {
    fn from(e: std::io::Error) -> Self {
        ClassifyError::Download(e.to_string())
    }
}
