//! Evaluation orchestration: one question against a batch of articles.

use std::collections::HashMap;

use morbyx_common::{MorbyxError, RiskFactor};
use morbyx_graph::{ArticleFetcher, ArticleStore};
use tracing::{debug, info, warn};

use crate::aggregate::{fold_article, AggregatedAnswer, ArticleEvidence};
use crate::config::QaConfig;
use crate::consolidate::consolidate;
use crate::reader::ReaderModel;
use crate::span::extract_candidates;
use crate::Result;

/// Runs the full extract-aggregate-consolidate pipeline over a batch.
pub struct RiskFactorExtractor<S, M> {
    fetcher: ArticleFetcher<S>,
    reader: M,
    config: QaConfig,
}

impl<S: ArticleStore, M: ReaderModel> RiskFactorExtractor<S, M> {
    pub fn new(fetcher: ArticleFetcher<S>, reader: M, config: QaConfig) -> Self {
        Self {
            fetcher,
            reader,
            config,
        }
    }

    /// Answer one question across all articles in the batch.
    ///
    /// Articles whose fetch exhausts its retries are skipped; the batch
    /// never fails because of a single article. Inference failures are the
    /// reader's to report and do abort the batch. An empty result means
    /// "no risk factors identified".
    pub async fn evaluate(
        &self,
        question: &str,
        article_ids: &[String],
    ) -> Result<Vec<RiskFactor>> {
        let mut answers: HashMap<String, AggregatedAnswer> = HashMap::new();

        for article_id in article_ids {
            let article = match self.fetcher.fetch(article_id).await {
                Ok(article) => article,
                Err(MorbyxError::ArticleFetchExhausted { article_id, attempts }) => {
                    warn!(
                        article_id = %article_id,
                        attempts,
                        "skipping article after fetch exhaustion"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(article_id = %article_id, error = %e, "skipping article");
                    continue;
                }
            };

            let scores = self.reader.infer(question, &article.text).await?;
            let candidates = extract_candidates(
                &scores.start_logits,
                &scores.end_logits,
                &scores.offsets,
                &article.text,
                self.config.n_best,
                self.config.max_answer_length,
            )?;
            debug!(
                article_id = %article.id,
                candidates = candidates.len(),
                "extracted candidate spans"
            );

            fold_article(
                &mut answers,
                ArticleEvidence {
                    article_id: article.id,
                    candidates,
                },
                self.config.max_answers_per_article,
                self.config.score_floor,
            );
        }

        let ranked = consolidate(&answers, self.config.keep_ratio);
        info!(
            question,
            articles = article_ids.len(),
            risk_factors = ranked.len(),
            "evaluation complete"
        );
        Ok(ranked)
    }
}
