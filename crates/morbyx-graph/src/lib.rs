//! morbyx-graph — Client for the disease knowledge graph API.
//!
//! Covers the data-access boundary of the pipeline:
//! - Disease listing
//! - Article search (PubMed-style term queries, resolved server-side)
//! - Article retrieval by id, with a bounded retry policy
//! - Risk-factor upload

pub mod client;
pub mod fetcher;
pub mod models;

use async_trait::async_trait;
use morbyx_common::{Article, Result};

pub use client::GraphClient;
pub use fetcher::ArticleFetcher;

/// Read access to stored articles.
///
/// The evaluation pipeline only needs single-article lookup at this seam;
/// search and upload stay on the concrete [`GraphClient`].
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Fetch one article by its identifier.
    async fn article(&self, id: &str) -> Result<Article>;
}
