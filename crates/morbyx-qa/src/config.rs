//! Configuration for the QA evaluation pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{QaError, Result};

/// Sidecar file written next to the trained reader weights.
pub const MAX_ANSWER_LENGTH_FILE: &str = "max_answer_length.json";

/// Tuning knobs of the span extraction / aggregation / consolidation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    /// How many top start and end token positions to consider per article.
    pub n_best: usize,

    /// Candidates kept per article before aggregation.
    pub max_answers_per_article: usize,

    /// Absolute logit-score floor; candidates below it never aggregate.
    pub score_floor: f32,

    /// Consolidation keeps answers scoring at least this fraction of the
    /// best aggregated score.
    pub keep_ratio: f32,

    /// Longest admissible answer, in characters. Derived from the training
    /// answer-length distribution and persisted as a sidecar record; the
    /// default only applies when no record is available.
    pub max_answer_length: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            n_best: 20,
            max_answers_per_article: 10,
            score_floor: 1.0,
            keep_ratio: 0.6,
            max_answer_length: 100,
        }
    }
}

impl QaConfig {
    pub fn with_n_best(mut self, n_best: usize) -> Self {
        self.n_best = n_best;
        self
    }

    pub fn with_max_answer_length(mut self, length: usize) -> Self {
        self.max_answer_length = length;
        self
    }

    /// Read `max_answer_length` from the sidecar record in `model_dir`.
    pub fn load_max_answer_length(mut self, model_dir: &Path) -> Result<Self> {
        let path = model_dir.join(MAX_ANSWER_LENGTH_FILE);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| QaError::InvalidInput(format!("{}: {}", path.display(), e)))?;
        let record: MaxAnswerLengthRecord = serde_json::from_str(&content)
            .map_err(|e| QaError::InvalidInput(format!("{}: {}", path.display(), e)))?;
        self.max_answer_length = record.max_answer_length;
        Ok(self)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MaxAnswerLengthRecord {
    max_answer_length: usize,
}
