//! End-to-end search pipeline: query → search → enrich → group.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use newslens_extract::HttpContentFetcher;
use newslens_llm::ChatCompletionsClient;
use newslens_search::BraveSearchClient;
use newslens_shared::{
    ArticleGroup, ArticleRecord, ChatMessage, ContentFetcher, FetchConfig, GroupedResult,
    LanguageModel, ModelFailurePolicy, NewsLensError, PipelineConfig, Result, SearchProvider,
};

use crate::cache::{CacheKey, GroupingCache};
use crate::enricher::ArticleEnricher;
use crate::grouping;
use crate::pool::EnrichmentPool;
use crate::prompt;

/// Label of the single group used when the model call fails.
pub const FALLBACK_GROUP_LABEL: &str = "All results";

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each article's enrichment slot is filled.
    fn article_enriched(&self, current: usize, total: usize);
    /// Called when the run produced a result.
    fn done(&self, result: &GroupedResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn article_enriched(&self, _current: usize, _total: usize) {}
    fn done(&self, _result: &GroupedResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Runs a query through search, enrichment and model grouping.
pub struct SearchGroupingPipeline {
    search: Arc<dyn SearchProvider>,
    pool: EnrichmentPool,
    model: Arc<dyn LanguageModel>,
    cache: GroupingCache,
    on_model_failure: ModelFailurePolicy,
}

impl std::fmt::Debug for SearchGroupingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchGroupingPipeline")
            .field("pool", &self.pool)
            .field("cache", &self.cache)
            .field("on_model_failure", &self.on_model_failure)
            .finish_non_exhaustive()
    }
}

impl SearchGroupingPipeline {
    /// Build a pipeline with the production HTTP collaborators.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let search = Arc::new(BraveSearchClient::new(&config.search)?);
        let fetcher = Arc::new(HttpContentFetcher::new(&config.fetch)?);
        let model = Arc::new(ChatCompletionsClient::new(&config.model)?);

        Ok(
            Self::with_collaborators(search, fetcher, model, &config.fetch)
                .with_cache(GroupingCache::new(&config.cache))
                .with_model_failure_policy(config.on_model_failure),
        )
    }

    /// Build a pipeline from arbitrary collaborators.
    ///
    /// Caching starts disabled and the model failure policy is the default.
    pub fn with_collaborators(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn ContentFetcher>,
        model: Arc<dyn LanguageModel>,
        fetch: &FetchConfig,
    ) -> Self {
        let enricher = ArticleEnricher::new(fetcher, fetch.timeout);
        Self {
            search,
            pool: EnrichmentPool::new(enricher, fetch.workers),
            model,
            cache: GroupingCache::disabled(),
            on_model_failure: ModelFailurePolicy::default(),
        }
    }

    pub fn with_cache(mut self, cache: GroupingCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_model_failure_policy(mut self, policy: ModelFailurePolicy) -> Self {
        self.on_model_failure = policy;
        self
    }

    /// Run a query without progress reporting.
    pub async fn run(&self, query: &str) -> Result<GroupedResult> {
        self.run_with_progress(query, &SilentProgress).await
    }

    /// Run a query.
    ///
    /// Fails only on an empty query or a search provider error, or on a model
    /// error when the policy is [`ModelFailurePolicy::Abort`]. Fetch and
    /// extraction failures degrade individual articles to their search
    /// metadata.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn run_with_progress(
        &self,
        query: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<GroupedResult> {
        let start = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(NewsLensError::validation("search query is empty"));
        }

        // --- Phase 1: Search ---
        progress.phase("Searching");
        let hits = self.search.search(query).await?;
        if hits.is_empty() {
            info!("search returned no results");
            let result = GroupedResult::new();
            progress.done(&result);
            return Ok(result);
        }

        // --- Phase 2: Enrichment ---
        progress.phase("Fetching articles");
        let records = self
            .pool
            .enrich_all_with(&hits, |current, total| {
                progress.article_enriched(current, total)
            })
            .await;

        // --- Phase 3: Grouping ---
        let key = CacheKey::new(query, &records);
        if let Some(cached) = self.cache.get(&key).await {
            info!(groups = cached.len(), "grouping served from cache");
            progress.done(&cached);
            return Ok(cached);
        }

        progress.phase("Grouping articles");
        let result = match self.group(&records).await {
            Ok(result) => {
                self.cache.insert(key, result.clone()).await;
                result
            }
            Err(e) => match self.on_model_failure {
                ModelFailurePolicy::Abort => return Err(e),
                ModelFailurePolicy::SingleGroup => {
                    warn!(error = %e, "grouping failed, returning a single group");
                    single_group(records)
                }
            },
        };

        info!(
            articles = hits.len(),
            groups = result.len(),
            grouped = result.article_count(),
            elapsed_ms = start.elapsed().as_millis(),
            "pipeline completed"
        );
        progress.done(&result);
        Ok(result)
    }

    /// One model call and a parse of its reply.
    async fn group(&self, records: &[ArticleRecord]) -> Result<GroupedResult> {
        let messages = [ChatMessage::user(prompt::build(records))];
        let reply = self.model.complete(&messages).await?;
        let result = grouping::parse(&reply, records);

        let omitted = records.len().saturating_sub(result.article_count());
        if omitted > 0 {
            info!(omitted, "model left some articles ungrouped");
        }
        Ok(result)
    }
}

fn single_group(records: Vec<ArticleRecord>) -> GroupedResult {
    GroupedResult::from_groups(vec![ArticleGroup {
        label: FALLBACK_GROUP_LABEL.to_string(),
        articles: records,
    }])
}
