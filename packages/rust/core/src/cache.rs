//! In-memory cache of grouping results.
//!
//! Keyed by the normalised query and a SHA-256 hash of the enriched batch, so
//! a repeated query only reuses a grouping when the model would have seen the
//! exact same articles. Each pipeline owns its own cache.

use moka::future::Cache;
use sha2::{Digest, Sha256};

use newslens_shared::{ArticleRecord, CacheConfig, GroupedResult};

/// Composite cache key: normalised query + batch hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased query with whitespace collapsed.
    query: String,
    /// Hex SHA-256 over every field of every record, in batch order.
    batch_hash: String,
}

impl CacheKey {
    pub fn new(query: &str, records: &[ArticleRecord]) -> Self {
        Self {
            query: normalize_query(query),
            batch_hash: batch_hash(records),
        }
    }
}

/// TTL- and capacity-bounded grouping cache. A zero TTL disables it.
#[derive(Clone)]
pub struct GroupingCache {
    inner: Option<Cache<CacheKey, GroupedResult>>,
}

impl std::fmt::Debug for GroupingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupingCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl GroupingCache {
    pub fn new(config: &CacheConfig) -> Self {
        if config.ttl.is_zero() || config.max_entries == 0 {
            return Self::disabled();
        }

        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { inner: Some(cache) }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Cached grouping for `key`, if present and not expired.
    pub async fn get(&self, key: &CacheKey) -> Option<GroupedResult> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    pub async fn insert(&self, key: CacheKey, result: GroupedResult) {
        if let Some(cache) = &self.inner {
            cache.insert(key, result).await;
        }
    }
}

fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Order-sensitive hash of a batch of records.
fn batch_hash(records: &[ArticleRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        for field in [
            record.url.as_str(),
            record.title.as_str(),
            record.source_name.as_str(),
            record.description.as_str(),
            record.summary.as_deref().unwrap_or_default(),
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        // Distinguishes a missing summary from an empty one.
        hasher.update([u8::from(record.summary.is_some())]);
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}
