//! Candidate answer-span extraction from per-token logits.
//!
//! For one article, the reader model yields a start and an end logit per
//! token plus an offset map back into the context. Every pairing of a
//! top-`n_best` start position with a top-`n_best` end position that lies
//! fully inside the context and respects the length cap becomes one
//! candidate, scored by the sum of the two logits.

use crate::{QaError, Result};

/// One extracted answer fragment for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSpan {
    pub text: String,
    /// Sum of the start-token and end-token logits.
    pub score: f32,
}

/// Indices of the `n_best` highest logits, descending by value.
///
/// Equal logits keep ascending index order (stable sort); which of two
/// tied positions ranks first is implementation-defined but deterministic.
fn top_indices(logits: &[f32], n_best: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..logits.len()).collect();
    indices.sort_by(|&a, &b| logits[b].total_cmp(&logits[a]));
    indices.truncate(n_best);
    indices
}

/// Extract all valid candidate spans for one article.
///
/// `offsets[i]` is the byte span of token `i` within `context`, or `None`
/// when the token belongs to the question or padding. Spans skipped:
/// missing offsets, `end < start` orderings, and texts longer than
/// `max_answer_length` characters. An empty result is a normal outcome
/// ("no answer in this article").
///
/// Offsets that point outside `context` (or split a character) are a
/// contract violation by the inference side and surface as
/// [`QaError::InvalidOffsets`].
pub fn extract_candidates(
    start_logits: &[f32],
    end_logits: &[f32],
    offsets: &[Option<(usize, usize)>],
    context: &str,
    n_best: usize,
    max_answer_length: usize,
) -> Result<Vec<CandidateSpan>> {
    if start_logits.len() != end_logits.len() || start_logits.len() != offsets.len() {
        return Err(QaError::InvalidOffsets(format!(
            "length mismatch: {} start logits, {} end logits, {} offsets",
            start_logits.len(),
            end_logits.len(),
            offsets.len()
        )));
    }

    let start_indexes = top_indices(start_logits, n_best);
    let end_indexes = top_indices(end_logits, n_best);

    let mut candidates = Vec::new();
    for &start_index in &start_indexes {
        let Some((char_start, _)) = offsets[start_index] else {
            continue;
        };
        for &end_index in &end_indexes {
            let Some((_, char_end)) = offsets[end_index] else {
                continue;
            };
            if end_index < start_index {
                continue;
            }

            let text = context.get(char_start..char_end).ok_or_else(|| {
                QaError::InvalidOffsets(format!(
                    "span {}..{} outside context of {} bytes",
                    char_start,
                    char_end,
                    context.len()
                ))
            })?;
            if text.chars().count() > max_answer_length {
                continue;
            }

            candidates.push(CandidateSpan {
                text: text.to_string(),
                score: start_logits[start_index] + end_logits[end_index],
            });
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    // "Smoking raises risk." tokenized per word.
    const CONTEXT: &str = "Smoking raises risk.";
    const OFFSETS: [Option<(usize, usize)>; 4] =
        [None, Some((0, 7)), Some((8, 14)), Some((15, 20))];

    #[test]
    fn test_single_dominant_span() {
        let start = [0.0, 9.0, -1.0, -2.0];
        let end = [0.0, 8.0, -1.0, -3.0];
        let spans = extract_candidates(&start, &end, &OFFSETS, CONTEXT, 1, 50).unwrap();
        assert_eq!(
            spans,
            vec![CandidateSpan { text: "Smoking".to_string(), score: 17.0 }]
        );
    }

    #[test]
    fn test_reversed_pairs_are_skipped() {
        let start = [0.0, -5.0, 9.0, -5.0];
        let end = [0.0, 8.0, -5.0, -5.0];
        // Best end (token 1) precedes best start (token 2).
        let spans = extract_candidates(&start, &end, &OFFSETS, CONTEXT, 1, 50).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_tokens_outside_context_are_skipped() {
        let start = [9.0, -5.0, -5.0, -5.0];
        let end = [9.0, -5.0, -5.0, -5.0];
        // Token 0 has no offset entry (question segment).
        let spans = extract_candidates(&start, &end, &OFFSETS, CONTEXT, 1, 50).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_length_cap_filters_long_spans() {
        let start = [0.0, 9.0, 1.0, -5.0];
        let end = [0.0, 1.0, 2.0, 9.0];
        // n_best = 2 admits "Smoking raises risk." (20 chars) and shorter pairs.
        let capped = extract_candidates(&start, &end, &OFFSETS, CONTEXT, 2, 14).unwrap();
        assert!(capped.iter().all(|s| s.text.chars().count() <= 14));
        assert!(capped.iter().any(|s| s.text == "Smoking raises"));

        let uncapped = extract_candidates(&start, &end, &OFFSETS, CONTEXT, 2, 50).unwrap();
        assert!(uncapped.iter().any(|s| s.text == "Smoking raises risk."));
    }

    #[test]
    fn test_score_is_logit_sum_over_cross_product() {
        let start = [0.0, 5.0, 4.0, -9.0];
        let end = [0.0, -9.0, 3.0, 2.0];
        let spans = extract_candidates(&start, &end, &OFFSETS, CONTEXT, 2, 50).unwrap();
        // 2 starts x 2 ends, all orderings valid: 4 candidates.
        assert_eq!(spans.len(), 4);
        let best = spans
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(best.text, "Smoking raises");
        assert_eq!(best.score, 8.0);
    }

    #[test]
    fn test_out_of_bounds_offset_is_fatal() {
        let offsets = [None, Some((0, 7)), Some((8, 14)), Some((15, 99))];
        let start = [0.0, 9.0, -1.0, -2.0];
        let end = [0.0, -5.0, -5.0, 9.0];
        let err = extract_candidates(&start, &end, &offsets, CONTEXT, 1, 50);
        assert!(matches!(err, Err(QaError::InvalidOffsets(_))));
    }

    #[test]
    fn test_tie_break_is_ascending_index() {
        let logits = [2.0, 3.0, 3.0, 1.0];
        assert_eq!(top_indices(&logits, 3), vec![1, 2, 0]);
    }
}
