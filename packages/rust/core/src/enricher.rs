//! Turns one search hit into an article record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use newslens_shared::{ArticleRecord, ContentFetcher, SearchHit};

/// Fetches and summarizes a hit's page, never failing.
///
/// Title, source name and description always come from the hit. Only the
/// summary comes from the fetched page, and any failure (error, timeout, empty
/// summary) leaves it as `None`.
#[derive(Clone)]
pub struct ArticleEnricher {
    fetcher: Arc<dyn ContentFetcher>,
    timeout: Duration,
}

impl std::fmt::Debug for ArticleEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleEnricher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ArticleEnricher {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    pub async fn enrich(&self, hit: &SearchHit) -> ArticleRecord {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch(&hit.url)).await {
            Ok(Ok(article)) => {
                debug!(url = %hit.url, summarized = article.summary.is_some(), "article enriched");
                ArticleRecord::with_summary(hit, article.summary)
            }
            Ok(Err(e)) => {
                warn!(url = %hit.url, error = %e, "enrichment failed, using search metadata");
                ArticleRecord::from_hit(hit)
            }
            Err(_) => {
                warn!(
                    url = %hit.url,
                    timeout_ms = self.timeout.as_millis(),
                    "enrichment timed out, using search metadata"
                );
                ArticleRecord::from_hit(hit)
            }
        }
    }
}
