//! Application configuration for NewsLens.
//!
//! User config lives at `~/.newslens/newslens.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file: each section names the environment
//! variable holding its key, resolved when the [`PipelineConfig`] is built.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NewsLensError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newslens.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newslens";

// ---------------------------------------------------------------------------
// Config structs (matching newslens.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search provider settings.
    #[serde(default)]
    pub search: SearchSection,

    /// Language model settings.
    #[serde(default)]
    pub model: ModelSection,

    /// Article fetch and summary settings.
    #[serde(default)]
    pub enrichment: EnrichmentSection,

    /// Grouping cache settings.
    #[serde(default)]
    pub cache: CacheSection,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    /// Web search endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the subscription token.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Number of results to request per query.
    #[serde(default = "default_result_count")]
    pub result_count: u32,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            result_count: default_result_count(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.search.brave.com/res/v1/web/search".into()
}
fn default_search_key_env() -> String {
    "BRAVE_SEARCH_API_KEY".into()
}
fn default_result_count() -> u32 {
    20
}

/// What to do when the grouping model call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFailurePolicy {
    /// Put every enriched article into a single group.
    #[default]
    SingleGroup,
    /// Fail the run with the model error.
    Abort,
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_model_key_env")]
    pub api_key_env: String,

    /// Request timeout for the grouping call.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    /// Behaviour when the grouping call fails.
    #[serde(default)]
    pub on_failure: ModelFailurePolicy,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            endpoint: default_model_endpoint(),
            model: default_model(),
            api_key_env: default_model_key_env(),
            timeout_secs: default_model_timeout(),
            on_failure: ModelFailurePolicy::default(),
        }
    }
}

fn default_model_endpoint() -> String {
    "https://api.together.xyz/v1".into()
}
fn default_model() -> String {
    "meta-llama/Llama-3-70b-chat-hf".into()
}
fn default_model_key_env() -> String {
    "TOGETHER_API_KEY".into()
}
fn default_model_timeout() -> u64 {
    60
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSection {
    /// Per-article fetch timeout.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent article fetches.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// User-Agent sent when fetching article pages.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum summary length in characters.
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,

    /// Maximum number of sentences kept in a summary.
    #[serde(default = "default_max_summary_sentences")]
    pub max_summary_sentences: usize,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            workers: default_workers(),
            user_agent: default_user_agent(),
            max_summary_chars: default_max_summary_chars(),
            max_summary_sentences: default_max_summary_sentences(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}
fn default_workers() -> usize {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:108.0) Gecko/20100101 Firefox/108.0".into()
}
fn default_max_summary_chars() -> usize {
    3000
}
fn default_max_summary_sentences() -> usize {
    2
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Time-to-live for cached groupings. 0 disables the cache.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Maximum number of cached groupings.
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    600
}
fn default_cache_entries() -> u64 {
    100
}

impl AppConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.search.result_count == 0 {
            return Err(NewsLensError::validation(
                "search.result_count must be greater than 0",
            ));
        }
        if self.enrichment.workers == 0 {
            return Err(NewsLensError::validation(
                "enrichment.workers must be greater than 0",
            ));
        }
        if self.enrichment.timeout_secs == 0 {
            return Err(NewsLensError::validation(
                "enrichment.timeout_secs must be greater than 0",
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(NewsLensError::validation(
                "model.timeout_secs must be greater than 0",
            ));
        }
        if self.enrichment.max_summary_sentences == 0 {
            return Err(NewsLensError::validation(
                "enrichment.max_summary_sentences must be greater than 0",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config file + env + CLI flags)
// ---------------------------------------------------------------------------

/// Search client settings with the resolved token.
#[derive(Clone)]
pub struct SearchClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub result_count: u32,
}

impl fmt::Debug for SearchClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("result_count", &self.result_count)
            .finish()
    }
}

/// Model client settings with the resolved key.
#[derive(Clone)]
pub struct ModelClientConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl fmt::Debug for ModelClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClientConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Article fetch and summary settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Bound on one fetch-and-summarize call.
    pub timeout: Duration,
    /// Concurrent enrichment workers.
    pub workers: usize,
    pub user_agent: String,
    pub max_summary_chars: usize,
    pub max_summary_sentences: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&EnrichmentSection::default())
    }
}

impl From<&EnrichmentSection> for FetchConfig {
    fn from(section: &EnrichmentSection) -> Self {
        Self {
            timeout: Duration::from_secs(section.timeout_secs),
            workers: section.workers,
            user_agent: section.user_agent.clone(),
            max_summary_chars: section.max_summary_chars,
            max_summary_sentences: section.max_summary_sentences,
        }
    }
}

/// Grouping cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Zero disables caching.
    pub ttl: Duration,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from(&CacheSection::default())
    }
}

impl From<&CacheSection> for CacheConfig {
    fn from(section: &CacheSection) -> Self {
        Self {
            ttl: Duration::from_secs(section.ttl_secs),
            max_entries: section.max_entries,
        }
    }
}

/// Everything a pipeline instance needs, passed to its constructor.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub search: SearchClientConfig,
    pub model: ModelClientConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub on_model_failure: ModelFailurePolicy,
}

impl PipelineConfig {
    /// Resolve an [`AppConfig`] against the process environment.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        Self::from_app_config_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve an [`AppConfig`] using `lookup` to read API key variables.
    pub fn from_app_config_with(
        config: &AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        config.validate()?;

        let search_key = require_key(&lookup, &config.search.api_key_env, "search")?;
        let model_key = require_key(&lookup, &config.model.api_key_env, "model")?;

        Ok(Self {
            search: SearchClientConfig {
                endpoint: config.search.endpoint.clone(),
                api_key: search_key,
                result_count: config.search.result_count,
            },
            model: ModelClientConfig {
                endpoint: config.model.endpoint.clone(),
                model: config.model.model.clone(),
                api_key: model_key,
                timeout: Duration::from_secs(config.model.timeout_secs),
            },
            fetch: FetchConfig::from(&config.enrichment),
            cache: CacheConfig::from(&config.cache),
            on_model_failure: config.model.on_failure,
        })
    }
}

fn require_key(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    what: &str,
) -> Result<String> {
    match lookup(var_name) {
        Some(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(NewsLensError::config(format!(
            "{what} API key not found. Set the {var_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newslens/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsLensError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newslens/newslens.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsLensError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NewsLensError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewsLensError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsLensError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsLensError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(name: &str) -> Option<String> {
        match name {
            "BRAVE_SEARCH_API_KEY" => Some("brave-token".into()),
            "TOGETHER_API_KEY" => Some("together-token".into()),
            _ => None,
        }
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("BRAVE_SEARCH_API_KEY"));
        assert!(toml_str.contains("single_group"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.enrichment.workers, 10);
        assert_eq!(parsed.enrichment.timeout_secs, 10);
        assert_eq!(parsed.model.model, "meta-llama/Llama-3-70b-chat-hf");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[model]
model = "mistralai/Mixtral-8x7B-Instruct-v0.1"
on_failure = "abort"

[enrichment]
workers = 4
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.model.model, "mistralai/Mixtral-8x7B-Instruct-v0.1");
        assert_eq!(config.model.on_failure, ModelFailurePolicy::Abort);
        assert_eq!(config.model.api_key_env, "TOGETHER_API_KEY");
        assert_eq!(config.enrichment.workers, 4);
        assert_eq!(config.enrichment.max_summary_sentences, 2);
        assert_eq!(config.cache.ttl_secs, 600);
    }

    #[test]
    fn pipeline_config_resolves_keys() {
        let config = PipelineConfig::from_app_config_with(&AppConfig::default(), keys)
            .expect("resolve");
        assert_eq!(config.search.api_key, "brave-token");
        assert_eq!(config.model.api_key, "together-token");
        assert_eq!(config.fetch.timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.workers, 10);
        assert_eq!(config.on_model_failure, ModelFailurePolicy::SingleGroup);
    }

    #[test]
    fn missing_key_names_the_variable() {
        let mut app = AppConfig::default();
        app.model.api_key_env = "NL_TEST_NONEXISTENT_KEY_12345".into();
        let err = PipelineConfig::from_app_config_with(&app, keys).unwrap_err();
        assert!(err.to_string().contains("NL_TEST_NONEXISTENT_KEY_12345"));
    }

    #[test]
    fn zero_workers_rejected() {
        let mut app = AppConfig::default();
        app.enrichment.workers = 0;
        let err = app.validate().unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = PipelineConfig::from_app_config_with(&AppConfig::default(), keys)
            .expect("resolve");
        let debug = format!("{config:?}");
        assert!(!debug.contains("brave-token"));
        assert!(!debug.contains("together-token"));
        assert!(debug.contains("<redacted>"));
    }
}
