//! Core pipeline for NewsLens.
//!
//! Ties the search, extraction and model collaborators together: a query's
//! hits are enriched concurrently into [`ArticleRecord`](newslens_shared::ArticleRecord)s,
//! described to the model in one prompt, and the model's free-text reply is
//! parsed back into a [`GroupedResult`](newslens_shared::GroupedResult).

pub mod cache;
pub mod enricher;
pub mod grouping;
pub mod pipeline;
pub mod pool;
pub mod prompt;

pub use cache::{CacheKey, GroupingCache};
pub use enricher::ArticleEnricher;
pub use grouping::{GroupAssignment, LineEvent, assignments, classify_line, parse, reconcile};
pub use pipeline::{FALLBACK_GROUP_LABEL, ProgressReporter, SearchGroupingPipeline, SilentProgress};
pub use pool::EnrichmentPool;
