//! Relevance filtering over an article batch.

use morbyx_graph::{ArticleFetcher, ArticleStore};
use tracing::{debug, warn};

use crate::model::RelevanceModel;
use crate::Result;

/// Fetches each article and keeps the ids the model judges relevant.
pub struct RelevanceStage<S, M> {
    fetcher: ArticleFetcher<S>,
    model: M,
}

impl<S: ArticleStore, M: RelevanceModel> RelevanceStage<S, M> {
    pub fn new(fetcher: ArticleFetcher<S>, model: M) -> Self {
        Self { fetcher, model }
    }

    /// Filter a batch of article ids down to the relevant ones.
    ///
    /// Articles whose fetch exhausts its retries are skipped; order of the
    /// surviving ids follows the input order.
    pub async fn filter(&self, article_ids: &[String]) -> Result<Vec<String>> {
        let mut relevant = Vec::new();

        for article_id in article_ids {
            let article = match self.fetcher.fetch(article_id).await {
                Ok(article) => article,
                Err(e) => {
                    warn!(article_id = %article_id, error = %e, "skipping article");
                    continue;
                }
            };

            if self.model.is_relevant(&article.text).await? {
                relevant.push(article.id);
            }
        }

        debug!(
            input = article_ids.len(),
            relevant = relevant.len(),
            "relevance stage complete"
        );
        Ok(relevant)
    }
}
