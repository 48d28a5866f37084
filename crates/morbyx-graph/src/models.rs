//! Wire types for the graph API.

use morbyx_common::{Article, Disease};
use serde::{Deserialize, Serialize};

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphResponseError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphResponseError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DiseasesData {
    pub diseases: Vec<Disease>,
}

#[derive(Debug, Deserialize)]
pub struct SearchArticlesData {
    #[serde(rename = "searchArticles")]
    pub search_articles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArticleData {
    pub article: Option<Article>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRiskFactorsData {
    #[serde(rename = "updateRiskFactors")]
    pub update_risk_factors: UpdateRiskFactorsPayload,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRiskFactorsPayload {
    #[serde(rename = "diseaseId")]
    pub disease_id: String,
}

/// Input shape of the `updateRiskFactors` mutation.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFactorInput {
    pub text: String,
    pub score: f32,
    #[serde(rename = "articlesIds")]
    pub articles_ids: Vec<String>,
}
