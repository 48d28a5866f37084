//! Bounded-retry wrapper around [`ArticleStore`].
//!
//! A flaky article lookup is retried a fixed number of times with a fixed
//! delay. When every attempt fails the error is reported per article; the
//! caller skips that article and continues with the rest of the batch.

use morbyx_common::{Article, MorbyxError, Result};
use std::time::Duration;
use tracing::warn;

use crate::ArticleStore;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct ArticleFetcher<S> {
    store: S,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<S: ArticleStore> ArticleFetcher<S> {
    /// Wrap a store with the default policy: 3 attempts total, 2 s apart.
    pub fn new(store: S) -> Self {
        Self::with_policy(store, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }

    pub fn with_policy(store: S, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            store,
            max_attempts,
            retry_delay,
        }
    }

    /// Fetch one article, retrying on any store failure.
    ///
    /// Returns [`MorbyxError::ArticleFetchExhausted`] once every attempt has
    /// failed; the underlying errors are logged, not surfaced.
    pub async fn fetch(&self, id: &str) -> Result<Article> {
        for attempt in 1..=self.max_attempts {
            match self.store.article(id).await {
                Ok(article) => return Ok(article),
                Err(e) => {
                    warn!(
                        article_id = id,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "article fetch attempt failed"
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(MorbyxError::ArticleFetchExhausted {
            article_id: id.to_string(),
            attempts: self.max_attempts,
        })
    }
}
