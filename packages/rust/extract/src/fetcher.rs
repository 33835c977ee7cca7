//! HTTP article fetcher.
//!
//! Downloads an article page, extracts its main text and builds an extractive
//! summary. Private and loopback hosts are refused unless explicitly allowed.

use std::net::IpAddr;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::{Attempt, Policy};
use tracing::{debug, instrument, warn};
use url::Url;

use newslens_shared::{ContentFetcher, ExtractedArticle, FetchConfig, NewsLensError, Result};

use crate::content::extract_text;
use crate::summarize::{SummaryOptions, summarize};

/// Pages larger than this are not parsed.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Maximum number of redirects followed per article.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// HttpContentFetcher
// ---------------------------------------------------------------------------

/// [`ContentFetcher`] that downloads pages over HTTP(S).
pub struct HttpContentFetcher {
    client: Client,
    options: SummaryOptions,
    /// Allow localhost/private IPs (for tests against mock servers).
    allow_private: bool,
}

impl std::fmt::Debug for HttpContentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContentFetcher")
            .field("options", &self.options)
            .field("allow_private", &self.allow_private)
            .finish_non_exhaustive()
    }
}

impl HttpContentFetcher {
    /// Build a fetcher from the enrichment settings.
    ///
    /// The per-request timeout is the enrichment timeout; the caller enforces
    /// the same bound around the whole fetch-and-summarize step.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Self::build(config, false)
    }

    /// Like [`new`](Self::new), but localhost/private IPs may be fetched (for
    /// integration tests against mock servers).
    pub fn allowing_private_hosts(config: &FetchConfig) -> Result<Self> {
        Self::build(config, true)
    }

    fn build(config: &FetchConfig, allow_private: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::custom(move |attempt| {
                redirect_decision(attempt, allow_private)
            }))
            .timeout(config.timeout)
            .build()
            .map_err(|e| NewsLensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            options: SummaryOptions {
                max_sentences: config.max_summary_sentences,
                max_chars: config.max_summary_chars,
            },
            allow_private,
        })
    }

    async fn download(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| NewsLensError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsLensError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(NewsLensError::extraction(format!(
                    "{url}: unsupported content type {content_type}"
                )));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| NewsLensError::Network(format!("{url}: body read failed: {e}")))?;
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(NewsLensError::extraction(format!("{url}: page too large")));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<ExtractedArticle> {
        let parsed = Url::parse(url)
            .map_err(|e| NewsLensError::validation(format!("invalid article url {url}: {e}")))?;

        if !self.allow_private && is_ssrf_target(&parsed) {
            warn!("refusing to fetch private or non-http target");
            return Err(NewsLensError::validation(format!(
                "refusing to fetch {url}: not a public http(s) address"
            )));
        }

        let body = self.download(&parsed).await?;
        let page = extract_text(&body);
        if page.text.is_empty() {
            return Err(NewsLensError::extraction(format!("{url}: no readable text")));
        }

        let summary = summarize(page.title.as_deref(), &page.text, self.options);
        debug!(
            text_chars = page.text.len(),
            summarized = summary.is_some(),
            "article extracted"
        );

        Ok(ExtractedArticle {
            text: page.text,
            summary,
        })
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml" || mime == "text/plain"
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

fn redirect_decision(attempt: Attempt<'_>, allow_private: bool) -> reqwest::redirect::Action {
    match check_redirect(attempt.url(), attempt.previous().len(), allow_private) {
        Ok(()) => attempt.follow(),
        Err(reason) => attempt.error(reason),
    }
}

/// Every redirect hop gets the same checks as the first request.
///
/// `hops` counts the URLs already requested in the chain, the original
/// included.
fn check_redirect(
    next: &Url,
    hops: usize,
    allow_private: bool,
) -> std::result::Result<(), String> {
    if hops > MAX_REDIRECTS {
        return Err(format!("too many redirects (max {MAX_REDIRECTS})"));
    }
    if !allow_private && is_ssrf_target(next) {
        warn!(target_url = %next, "refusing redirect to private or non-http target");
        return Err(format!("redirect to {next} refused: not a public http(s) address"));
    }
    Ok(())
}

/// Whether a URL points somewhere an article fetch must not go.
fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            let host = host.to_ascii_lowercase();
            host == "localhost"
                || host.ends_with(".localhost")
                || host.ends_with(".local")
                || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Loopback, private, link-local and other reserved ranges.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 carrier-grade NAT
                || (a == 100 && (b & 0xC0) == 64)
                // 192.0.0.0/24
                || (a == 192 && b == 0 && c == 0)
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (first & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (first & 0xffc0) == 0xfe80
                || v6.to_ipv4_mapped().is_some_and(|v4| is_private_ip(&IpAddr::V4(v4)))
        }
    }
}
