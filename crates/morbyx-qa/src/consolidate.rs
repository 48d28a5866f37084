//! Final thresholding and containment resolution.
//!
//! A strong answer that is a superstring or substring of a weaker one is
//! redundant phrasing of the same fact; only the higher-confidence variant
//! is kept.

use std::collections::HashMap;

use morbyx_common::RiskFactor;

use crate::aggregate::AggregatedAnswer;

/// Collapse the aggregated mapping into the final ranked answer list.
///
/// Entries scoring below `keep_ratio` of the best score are dropped, the
/// rest are sorted descending by score (equal scores ordered by text,
/// ascending; implementation-defined but deterministic), then scanned
/// against the accepted-so-far list in insertion order:
///
/// - an already-accepted superstring with a strictly higher score drops
///   the candidate;
/// - an already-accepted substring with a strictly lower score is evicted
///   and the candidate accepted.
///
/// The first matching conflict ends the scan for that candidate; a
/// candidate with no conflict is accepted unconditionally. Output keeps
/// descending-score order.
pub fn consolidate(
    aggregated: &HashMap<String, AggregatedAnswer>,
    keep_ratio: f32,
) -> Vec<RiskFactor> {
    if aggregated.is_empty() {
        return Vec::new();
    }

    let max_score = aggregated
        .values()
        .map(|answer| answer.score)
        .fold(f32::NEG_INFINITY, f32::max);
    let threshold = max_score * keep_ratio;

    let mut ranked: Vec<RiskFactor> = aggregated
        .iter()
        .filter(|(_, answer)| answer.score >= threshold)
        .map(|(text, answer)| RiskFactor {
            text: text.clone(),
            score: answer.score,
            article_ids: answer.article_ids.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.text.cmp(&b.text)));

    let mut accepted: Vec<RiskFactor> = Vec::new();
    'candidates: for candidate in ranked {
        for i in 0..accepted.len() {
            if accepted[i].text.contains(&candidate.text) && accepted[i].score > candidate.score {
                continue 'candidates;
            }
            if candidate.text.contains(&accepted[i].text) && candidate.score > accepted[i].score {
                accepted.remove(i);
                break;
            }
        }
        accepted.push(candidate);
    }

    accepted
}
