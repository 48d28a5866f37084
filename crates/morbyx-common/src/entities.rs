//! Core entity types mirroring the disease knowledge base schema.
//! These are Rust representations of the graph API payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Disease
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disease {
    pub id: String,
    /// Known names, preferred name first.
    pub names: Vec<String>,
}

impl Disease {
    /// Preferred display name (first entry of `names`).
    pub fn preferred_name(&self) -> Option<&str> {
        self.names.first().map(|n| n.as_str())
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// A scientific article as served by the graph API: the identifier plus the
/// full context text the models read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Risk factor
// ---------------------------------------------------------------------------

/// A single ranked risk-factor statement for one disease.
///
/// `text` is lower-cased answer text, `score` is the best logit score seen
/// for that text across the article batch, and `article_ids` is the set of
/// articles that support it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub text: String,
    pub score: f32,
    pub article_ids: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_name_is_first() {
        let disease = Disease {
            id: "H00409".to_string(),
            names: vec!["Type 2 diabetes mellitus".to_string(), "NIDDM".to_string()],
        };
        assert_eq!(disease.preferred_name(), Some("Type 2 diabetes mellitus"));
    }

    #[test]
    fn test_preferred_name_empty() {
        let disease = Disease { id: "X".to_string(), names: vec![] };
        assert_eq!(disease.preferred_name(), None);
    }
}
