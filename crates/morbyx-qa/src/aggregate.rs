//! Cross-document answer aggregation.
//!
//! Folds each article's candidate spans into one running mapping keyed by
//! lower-cased answer text. Scores are max-merged, supporting article ids
//! union-merged, so the fold is commutative in article order.

use std::collections::{BTreeSet, HashMap};

use crate::span::CandidateSpan;

/// Per-article extraction result, consumed immediately by the fold.
#[derive(Debug, Clone)]
pub struct ArticleEvidence {
    pub article_id: String,
    pub candidates: Vec<CandidateSpan>,
}

/// One entry of the aggregation mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedAnswer {
    /// Highest score observed for this text across the batch.
    pub score: f32,
    /// Every article that produced this text above the score floor.
    pub article_ids: BTreeSet<String>,
}

/// Fold one article's evidence into the running mapping.
///
/// Only the `max_answers` best-scoring candidates of the article are
/// considered, and candidates scoring below `score_floor` are discarded
/// outright. Surviving texts are keyed lower-cased; an existing entry has
/// its score raised to the maximum seen and gains this article's id.
pub fn fold_article(
    answers: &mut HashMap<String, AggregatedAnswer>,
    evidence: ArticleEvidence,
    max_answers: usize,
    score_floor: f32,
) {
    let mut candidates = evidence.candidates;
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(max_answers);

    for candidate in candidates {
        if candidate.score < score_floor {
            continue;
        }
        let key = candidate.text.to_lowercase();
        match answers.get_mut(&key) {
            Some(existing) => {
                if candidate.score > existing.score {
                    existing.score = candidate.score;
                }
                existing.article_ids.insert(evidence.article_id.clone());
            }
            None => {
                answers.insert(
                    key,
                    AggregatedAnswer {
                        score: candidate.score,
                        article_ids: BTreeSet::from([evidence.article_id.clone()]),
                    },
                );
            }
        }
    }
}

/// Aggregate a whole batch. An empty mapping means "no risk factors found",
/// not an error.
pub fn aggregate(
    per_article: impl IntoIterator<Item = ArticleEvidence>,
    max_answers: usize,
    score_floor: f32,
) -> HashMap<String, AggregatedAnswer> {
    let mut answers = HashMap::new();
    for evidence in per_article {
        fold_article(&mut answers, evidence, max_answers, score_floor);
    }
    answers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(article_id: &str, candidates: &[(&str, f32)]) -> ArticleEvidence {
        ArticleEvidence {
            article_id: article_id.to_string(),
            candidates: candidates
                .iter()
                .map(|(text, score)| CandidateSpan { text: text.to_string(), score: *score })
                .collect(),
        }
    }

    #[test]
    fn test_case_variants_merge_to_max_score() {
        let answers = aggregate(
            vec![
                evidence("art1", &[("hypertension", 5.0)]),
                evidence("art2", &[("Hypertension", 3.0)]),
            ],
            10,
            1.0,
        );

        assert_eq!(answers.len(), 1);
        let merged = &answers["hypertension"];
        assert_eq!(merged.score, 5.0);
        assert_eq!(
            merged.article_ids,
            BTreeSet::from(["art1".to_string(), "art2".to_string()])
        );
    }

    #[test]
    fn test_score_floor_excludes_even_top_ranked() {
        let answers = aggregate(vec![evidence("art1", &[("obesity", 0.9)])], 10, 1.0);
        assert!(answers.is_empty());
    }

    #[test]
    fn test_per_article_cap_keeps_best_scoring() {
        let candidates: Vec<(String, f32)> =
            (0..15).map(|i| (format!("factor {i}"), 1.0 + i as f32)).collect();
        let refs: Vec<(&str, f32)> =
            candidates.iter().map(|(t, s)| (t.as_str(), *s)).collect();

        let answers = aggregate(vec![evidence("art1", &refs)], 10, 1.0);
        assert_eq!(answers.len(), 10);
        // The five weakest candidates were cut before the floor applied.
        assert!(!answers.contains_key("factor 0"));
        assert!(answers.contains_key("factor 14"));
    }

    #[test]
    fn test_empty_batch_yields_empty_mapping() {
        let answers = aggregate(Vec::<ArticleEvidence>::new(), 10, 1.0);
        assert!(answers.is_empty());
    }

    #[test]
    fn test_fold_is_commutative_in_article_order() {
        let forward = aggregate(
            vec![
                evidence("art1", &[("smoking", 2.0), ("alcohol", 4.0)]),
                evidence("art2", &[("smoking", 6.0)]),
            ],
            10,
            1.0,
        );
        let backward = aggregate(
            vec![
                evidence("art2", &[("smoking", 6.0)]),
                evidence("art1", &[("smoking", 2.0), ("alcohol", 4.0)]),
            ],
            10,
            1.0,
        );
        assert_eq!(forward, backward);
        assert_eq!(forward["smoking"].score, 6.0);
        assert_eq!(forward["smoking"].article_ids.len(), 2);
    }
}
