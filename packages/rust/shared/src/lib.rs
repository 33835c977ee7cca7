//! Shared types, error model, configuration, and collaborator traits for NewsLens.
//!
//! This crate is the foundation depended on by all other NewsLens crates.
//! It provides:
//! - [`NewsLensError`], the unified error type
//! - Domain types ([`SearchHit`], [`ArticleRecord`], [`GroupedResult`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)
//! - Collaborator traits ([`SearchProvider`], [`ContentFetcher`], [`LanguageModel`])

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, CacheSection, EnrichmentSection, FetchConfig, ModelClientConfig,
    ModelFailurePolicy, ModelSection, PipelineConfig, SearchClientConfig, SearchSection,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{NewsLensError, Result};
pub use traits::{ChatMessage, ContentFetcher, ExtractedArticle, LanguageModel, Role, SearchProvider};
pub use types::{ArticleGroup, ArticleRecord, GroupedResult, SUMMARY_FAILURE_SENTINEL, SearchHit};
