//! OpenAI-compatible chat-completions client.
//!
//! Works against any provider exposing `POST {endpoint}/chat/completions`
//! (Together AI by default). Implements [`LanguageModel`]; every failure is
//! reported as [`NewsLensError::Model`] so the pipeline can apply its
//! configured failure policy.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use newslens_shared::{ChatMessage, LanguageModel, ModelClientConfig, NewsLensError, Result};

/// Provider error bodies are cut to this many characters in error messages.
const MAX_ERROR_BODY_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Chat-completions client for a single configured model.
pub struct ChatCompletionsClient {
    client: Client,
    url: String,
    model: String,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Build a client. The API key is sent as a bearer token on every request.
    pub fn new(config: &ModelClientConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|_| NewsLensError::config("model API key contains invalid characters"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NewsLensError::Model(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "model request failed");
                NewsLensError::Model(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "model API error");
            return Err(NewsLensError::Model(format!(
                "HTTP {status}: {}",
                truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS)
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| NewsLensError::Model(format!("invalid response body: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| NewsLensError::Model("response contained no choices".into()))?;

        debug!(
            duration_ms = start.elapsed().as_millis(),
            chars = content.len(),
            "chat completion received"
        );

        Ok(content)
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
