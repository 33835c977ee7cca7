//! Core domain types: search hits, enriched articles, and grouping output.

use serde::{Deserialize, Serialize};

/// Phrase the summarizer leaves behind when it could not produce a summary.
/// Any summary containing it is treated exactly like a missing summary.
pub const SUMMARY_FAILURE_SENTINEL: &str = "Something went wrong";

// ---------------------------------------------------------------------------
// SearchHit
// ---------------------------------------------------------------------------

/// One raw result returned by the search provider for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result URL, unique within a batch.
    pub url: String,
    /// Result title.
    pub title: String,
    /// Name of the publishing site (e.g. "Reuters").
    pub source_name: String,
    /// Provider-supplied snippet.
    pub description: String,
}

// ---------------------------------------------------------------------------
// ArticleRecord
// ---------------------------------------------------------------------------

/// An enriched search hit. The URL is the identifier used throughout a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub source_name: String,
    pub description: String,
    /// Extractive summary of the page, `None` when fetching or summarizing failed.
    #[serde(default)]
    pub summary: Option<String>,
}

impl ArticleRecord {
    /// Build a record from search metadata alone (the degraded path).
    pub fn from_hit(hit: &SearchHit) -> Self {
        Self {
            url: hit.url.clone(),
            title: hit.title.clone(),
            source_name: hit.source_name.clone(),
            description: hit.description.clone(),
            summary: None,
        }
    }

    /// Build a record from search metadata plus an extracted summary.
    pub fn with_summary(hit: &SearchHit, summary: Option<String>) -> Self {
        Self {
            summary: summary.filter(|s| !s.trim().is_empty()),
            ..Self::from_hit(hit)
        }
    }

    /// Whether the summary is present, non-blank and not the failure sentinel.
    pub fn has_usable_summary(&self) -> bool {
        self.summary
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty() && !s.contains(SUMMARY_FAILURE_SENTINEL))
    }

    /// Text to show for this article: the summary when usable, else the description.
    pub fn effective_text(&self) -> &str {
        match self.summary.as_deref() {
            Some(summary) if self.has_usable_summary() => summary,
            _ => &self.description,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupedResult
// ---------------------------------------------------------------------------

/// A labelled group of articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleGroup {
    pub label: String,
    pub articles: Vec<ArticleRecord>,
}

/// Ordered mapping from group label to member articles.
///
/// Labels are unique and non-empty. Each article appears in at most one group,
/// and every article comes from the batch the result was built against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedResult {
    groups: Vec<ArticleGroup>,
}

impl GroupedResult {
    /// An empty result (zero groups).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from groups that already satisfy the invariants.
    ///
    /// Callers outside the grouping parser should go through it instead.
    pub fn from_groups(groups: Vec<ArticleGroup>) -> Self {
        Self { groups }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of articles across all groups.
    pub fn article_count(&self) -> usize {
        self.groups.iter().map(|g| g.articles.len()).sum()
    }

    /// Group labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }

    /// Members of the group with the given label.
    pub fn get(&self, label: &str) -> Option<&[ArticleRecord]> {
        self.groups
            .iter()
            .find(|g| g.label == label)
            .map(|g| g.articles.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArticleGroup> {
        self.groups.iter()
    }

    /// Look up an article by URL in any group (used by detail views).
    pub fn find_article(&self, url: &str) -> Option<&ArticleRecord> {
        self.groups
            .iter()
            .flat_map(|g| g.articles.iter())
            .find(|a| a.url == url)
    }
}
