//! Brave Web Search client.
//!
//! Implements [`SearchProvider`] over the Brave Search JSON API. Any
//! non-success response is a hard failure for the calling pipeline run, so
//! errors from this crate are always [`NewsLensError::Search`].

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use newslens_shared::{NewsLensError, Result, SearchClientConfig, SearchHit, SearchProvider};

/// Header carrying the Brave subscription token.
const TOKEN_HEADER: &str = "x-subscription-token";

/// Default timeout in seconds for search requests.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("NewsLens/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    profile: Option<BraveProfile>,
}

#[derive(Debug, Deserialize)]
struct BraveProfile {
    #[serde(default)]
    name: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Search provider backed by the Brave Web Search API.
pub struct BraveSearchClient {
    client: Client,
    endpoint: String,
    result_count: u32,
}

impl std::fmt::Debug for BraveSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveSearchClient")
            .field("endpoint", &self.endpoint)
            .field("result_count", &self.result_count)
            .finish_non_exhaustive()
    }
}

impl BraveSearchClient {
    /// Build a client. The token is installed as a default header.
    pub fn new(config: &SearchClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut token = HeaderValue::from_str(config.api_key.trim())
            .map_err(|_| NewsLensError::config("search API key contains invalid characters"))?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| NewsLensError::Search(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            result_count: config.result_count,
        })
    }
}

#[async_trait]
impl SearchProvider for BraveSearchClient {
    #[instrument(skip_all, fields(query = %query))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NewsLensError::validation("search query is empty"));
        }

        let count = self.result_count.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| NewsLensError::Search(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsLensError::Search(format!("HTTP {status}")));
        }

        let body: BraveResponse = response
            .json()
            .await
            .map_err(|e| NewsLensError::Search(format!("invalid response body: {e}")))?;

        let raw = body.web.map(|w| w.results).unwrap_or_default();
        let raw_count = raw.len();
        let hits = into_hits(raw);

        info!(
            returned = raw_count,
            kept = hits.len(),
            "search completed"
        );

        Ok(hits)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map provider results to hits, keeping the first occurrence of each URL.
fn into_hits(results: Vec<BraveResult>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    let mut hits = Vec::with_capacity(results.len());

    for result in results {
        let url = result.url.trim().to_string();
        if url.is_empty() {
            debug!("dropping result without url");
            continue;
        }
        if !seen.insert(url.clone()) {
            debug!(%url, "dropping duplicate result");
            continue;
        }

        let source_name = result
            .profile
            .map(|p| p.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| host_of(&url));

        hits.push(SearchHit {
            title: strip_markup(&result.title),
            description: strip_markup(&result.description),
            source_name,
            url,
        });
    }

    hits
}

/// Host name of a URL, or the URL itself if it does not parse.
fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}

/// Remove inline HTML (Brave wraps matched terms in `<strong>`) and decode entities.
fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.trim().to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}
