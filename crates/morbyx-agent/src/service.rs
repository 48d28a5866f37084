//! Per-disease evaluation sweep.
//!
//! For every disease in the knowledge graph: search candidate articles,
//! keep the ones the relevance classifier accepts, ask the QA pipeline for
//! risk factors, and upload the ranked result.

use morbyx_classify::{RelevanceModel, RelevanceStage};
use morbyx_graph::{ArticleFetcher, GraphClient};
use morbyx_qa::{QaConfig, ReaderModel, RiskFactorExtractor};
use tracing::info;
use uuid::Uuid;

pub struct RiskFactorService<C, Q> {
    graph: GraphClient,
    relevance: RelevanceStage<GraphClient, C>,
    extractor: RiskFactorExtractor<GraphClient, Q>,
    max_articles: usize,
}

impl<C: RelevanceModel, Q: ReaderModel> RiskFactorService<C, Q> {
    pub fn new(
        graph: GraphClient,
        classifier: C,
        reader: Q,
        qa_config: QaConfig,
        max_articles: usize,
    ) -> Self {
        let relevance = RelevanceStage::new(ArticleFetcher::new(graph.clone()), classifier);
        let extractor =
            RiskFactorExtractor::new(ArticleFetcher::new(graph.clone()), reader, qa_config);
        Self {
            graph,
            relevance,
            extractor,
            max_articles,
        }
    }

    /// Evaluate every disease and upload its risk factors.
    pub async fn evaluate_all(&self) -> anyhow::Result<()> {
        let run_id = Uuid::new_v4();
        let diseases = self.graph.list_diseases().await?;
        info!(run_id = %run_id, diseases = diseases.len(), "starting risk-factor sweep");

        for disease in &diseases {
            let Some(name) = disease.preferred_name() else {
                continue;
            };
            info!(run_id = %run_id, disease_id = %disease.id, name, "learning risk factors");

            let term = format!(
                "\"{name}\"[Title/Abstract/MeSH Terms] AND \"Risk Factors\"[Title/Abstract/MeSH Terms]"
            );
            let article_ids = self.graph.search_articles(&term, self.max_articles).await?;
            if article_ids.is_empty() {
                continue;
            }

            let relevant = self.relevance.filter(&article_ids).await?;
            if relevant.is_empty() {
                info!(disease_id = %disease.id, "no relevant articles");
                continue;
            }

            let question = format!("What are the risk factors of {name}?");
            let risk_factors = self.extractor.evaluate(&question, &relevant).await?;
            if risk_factors.is_empty() {
                info!(disease_id = %disease.id, "no risk factors found");
                continue;
            }

            info!(
                disease_id = %disease.id,
                risk_factors = risk_factors.len(),
                "uploading risk factors"
            );
            self.graph
                .update_risk_factors(&disease.id, &risk_factors)
                .await?;
        }

        info!(run_id = %run_id, "risk-factor sweep complete");
        Ok(())
    }
}
