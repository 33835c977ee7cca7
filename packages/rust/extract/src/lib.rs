//! Article fetching, main-content extraction and extractive summarization.
//!
//! [`HttpContentFetcher`] is the production [`ContentFetcher`](newslens_shared::ContentFetcher):
//! it downloads a page, isolates the article body with [`extract_text`], and
//! summarizes it with [`summarize`].

pub mod content;
pub mod fetcher;
pub mod summarize;

pub use content::{PageText, extract_text};
pub use fetcher::HttpContentFetcher;
pub use summarize::{SummaryOptions, summarize};
