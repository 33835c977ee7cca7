//! Bounded-concurrency enrichment of a whole batch.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use newslens_shared::{ArticleRecord, SearchHit};

use crate::enricher::ArticleEnricher;

/// Enriches a batch of hits with at most `workers` fetches in flight.
#[derive(Debug, Clone)]
pub struct EnrichmentPool {
    enricher: ArticleEnricher,
    workers: usize,
}

impl EnrichmentPool {
    /// A `workers` of zero is raised to one.
    pub fn new(enricher: ArticleEnricher, workers: usize) -> Self {
        Self {
            enricher,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Enrich every hit. The output has the same length and order as `hits`.
    pub async fn enrich_all(&self, hits: &[SearchHit]) -> Vec<ArticleRecord> {
        self.enrich_all_with(hits, |_, _| {}).await
    }

    /// Like [`enrich_all`](Self::enrich_all), calling `on_enriched(current, total)`
    /// as each output slot is filled.
    #[instrument(skip_all, fields(articles = hits.len(), workers = self.workers))]
    pub async fn enrich_all_with(
        &self,
        hits: &[SearchHit],
        mut on_enriched: impl FnMut(usize, usize),
    ) -> Vec<ArticleRecord> {
        if hits.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let handles: Vec<_> = hits
            .iter()
            .cloned()
            .map(|hit| {
                let sem = semaphore.clone();
                let enricher = self.enricher.clone();
                tokio::spawn(async move {
                    // The semaphore is never closed, so a permit is always granted.
                    let _permit = sem.acquire().await.ok();
                    enricher.enrich(&hit).await
                })
            })
            .collect();

        let total = hits.len();
        let mut records = Vec::with_capacity(total);
        let mut summarized = 0;

        for (i, (hit, handle)) in hits.iter().zip(handles).enumerate() {
            let record = match handle.await {
                Ok(record) => record,
                Err(e) => {
                    warn!(url = %hit.url, error = %e, "enrichment task did not complete");
                    ArticleRecord::from_hit(hit)
                }
            };
            if record.has_usable_summary() {
                summarized += 1;
            }
            records.push(record);
            on_enriched(i + 1, total);
        }

        info!(total, summarized, "enrichment completed");
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use newslens_shared::{ContentFetcher, ExtractedArticle, NewsLensError, Result};

    /// Fetcher whose behaviour is chosen by the URL path.
    #[derive(Default)]
    struct ScriptedFetcher {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ContentFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<ExtractedArticle> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = if url.ends_with("slow") { 40 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.ends_with("fail") {
                return Err(NewsLensError::Network(format!("{url}: HTTP 500")));
            }
            if url.ends_with("hang") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if url.ends_with("panic") {
                panic!("parser crashed on {url}");
            }
            Ok(ExtractedArticle {
                text: "Body.".into(),
                summary: Some(format!("Summary of {url}.")),
            })
        }
    }

    fn hits(paths: &[&str]) -> Vec<SearchHit> {
        paths
            .iter()
            .map(|p| SearchHit {
                url: format!("https://news.example.com/{p}"),
                title: format!("Title {p}"),
                source_name: "Example".into(),
                description: format!("Description {p}"),
            })
            .collect()
    }

    fn pool(fetcher: Arc<ScriptedFetcher>, workers: usize) -> EnrichmentPool {
        let enricher = ArticleEnricher::new(fetcher, Duration::from_millis(200));
        EnrichmentPool::new(enricher, workers)
    }

    #[tokio::test]
    async fn empty_input_returns_empty() {
        let pool = pool(Arc::new(ScriptedFetcher::default()), 4);
        assert!(pool.enrich_all(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn preserves_order_and_length_under_failures() {
        let input = hits(&["slow", "fail", "ok", "hang", "panic", "ok2"]);
        let records = pool(Arc::new(ScriptedFetcher::default()), 3)
            .enrich_all(&input)
            .await;

        assert_eq!(records.len(), input.len());
        for (hit, record) in input.iter().zip(&records) {
            assert_eq!(record.url, hit.url);
            assert_eq!(record.title, hit.title);
            assert_eq!(record.description, hit.description);
        }

        assert!(records[0].has_usable_summary());
        assert!(records[1].summary.is_none());
        assert!(records[2].has_usable_summary());
        assert!(records[3].summary.is_none());
        assert!(records[4].summary.is_none());
        assert!(records[5].has_usable_summary());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn respects_worker_budget() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let input = hits(&["slow1", "slow2", "slow3", "slow4", "slow5", "slow6"]);
        let records = pool(fetcher.clone(), 2).enrich_all(&input).await;

        assert_eq!(records.len(), 6);
        let max = fetcher.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 2, "max in flight was {max}");
    }

    #[tokio::test]
    async fn zero_workers_is_raised_to_one() {
        let pool = pool(Arc::new(ScriptedFetcher::default()), 0);
        assert_eq!(pool.workers(), 1);
        let records = pool.enrich_all(&hits(&["a", "b"])).await;
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn reports_progress_per_slot() {
        let input = hits(&["a", "fail", "c"]);
        let mut seen = Vec::new();
        pool(Arc::new(ScriptedFetcher::default()), 2)
            .enrich_all_with(&input, |current, total| seen.push((current, total)))
            .await;
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
