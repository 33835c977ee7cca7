//! Collaborator seams: search provider, content fetcher, language model.
//!
//! The core pipeline only talks to these traits. Concrete HTTP clients live in
//! the `newslens-search`, `newslens-extract` and `newslens-llm` crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::SearchHit;

/// Supplies raw search hits for a query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query. A non-success response from the provider is an error.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Readable text and an extractive summary pulled from an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub text: String,
    pub summary: Option<String>,
}

/// Fetches an article URL and summarizes it.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ExtractedArticle>;
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat exchange with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Produces one free-text completion for a message history.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
