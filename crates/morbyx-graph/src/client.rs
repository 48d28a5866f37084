//! GraphQL client for the disease knowledge graph.
//!
//! Operations used:
//!   diseases:          list all diseases with their names
//!   searchArticles:    term search, returns matching article ids
//!   article:           fetch one article (id + text)
//!   updateRiskFactors: replace the risk factors stored for a disease

use async_trait::async_trait;
use morbyx_common::{Article, Disease, MorbyxError, Result, RiskFactor};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::models::{
    ArticleData, DiseasesData, GraphResponse, RiskFactorInput, SearchArticlesData,
    UpdateRiskFactorsData,
};
use crate::ArticleStore;

const DISEASES_QUERY: &str = "query diseases { diseases { id names } }";

const SEARCH_ARTICLES_QUERY: &str = "query searchArticles($search: String!, $maxResults: Int!) {
  searchArticles(search: $search, maxResults: $maxResults)
}";

const ARTICLE_QUERY: &str = "query article($articleId: ID!) {
  article(id: $articleId) { id text }
}";

const UPDATE_RISK_FACTORS_MUTATION: &str =
    "mutation updateRiskFactors($diseaseId: String!, $riskFactors: [RiskFactorInput!]!) {
  updateRiskFactors(input: { diseaseId: $diseaseId, riskFactors: $riskFactors }) { diseaseId }
}";

#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    endpoint: String,
    auth_token: Option<SecretString>,
}

impl GraphClient {
    pub fn new(endpoint: impl Into<String>, auth_token: Option<SecretString>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            auth_token,
        })
    }

    /// Execute one GraphQL operation and unwrap the response envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }));

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response: GraphResponse<T> = request.send().await?.json().await?;

        if let Some(errors) = response.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(MorbyxError::Graph(messages.join("; ")));
        }

        response
            .data
            .ok_or_else(|| MorbyxError::Graph("response carried no data".to_string()))
    }

    /// List all diseases in the knowledge graph.
    #[instrument(skip(self))]
    pub async fn list_diseases(&self) -> Result<Vec<Disease>> {
        let data: DiseasesData = self.execute(DISEASES_QUERY, json!({})).await?;
        debug!(count = data.diseases.len(), "graph returned diseases");
        Ok(data.diseases)
    }

    /// Search articles by a PubMed-style term string; returns article ids.
    #[instrument(skip(self))]
    pub async fn search_articles(&self, search: &str, max_results: usize) -> Result<Vec<String>> {
        let data: SearchArticlesData = self
            .execute(
                SEARCH_ARTICLES_QUERY,
                json!({ "search": search, "maxResults": max_results }),
            )
            .await?;
        debug!(count = data.search_articles.len(), "graph returned article ids");
        Ok(data.search_articles)
    }

    /// Replace the stored risk factors for one disease.
    #[instrument(skip(self, risk_factors))]
    pub async fn update_risk_factors(
        &self,
        disease_id: &str,
        risk_factors: &[RiskFactor],
    ) -> Result<()> {
        let inputs: Vec<RiskFactorInput> = risk_factors
            .iter()
            .map(|rf| RiskFactorInput {
                text: rf.text.clone(),
                score: rf.score,
                articles_ids: rf.article_ids.iter().cloned().collect(),
            })
            .collect();

        let _: UpdateRiskFactorsData = self
            .execute(
                UPDATE_RISK_FACTORS_MUTATION,
                json!({ "diseaseId": disease_id, "riskFactors": inputs }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for GraphClient {
    async fn article(&self, id: &str) -> Result<Article> {
        let data: ArticleData = self
            .execute(ARTICLE_QUERY, json!({ "articleId": id }))
            .await?;
        data.article
            .ok_or_else(|| MorbyxError::ArticleNotFound(id.to_string()))
    }
}
