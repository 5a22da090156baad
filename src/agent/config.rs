//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default model for every call site unless overridden.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default max tokens for the JSON call sites (key, planner, reformulator).
const DEFAULT_JSON_MAX_TOKENS: u32 = 512;
/// Default synthesizer max tokens.
const DEFAULT_SYNTHESIZER_MAX_TOKENS: u32 = 2048;
/// Default reasoning request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default search and extraction timeout in seconds.
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
/// Default cache read and write timeout in seconds.
const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 10;
/// Default iteration budget per session.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
/// Default number of search results requested.
pub const DEFAULT_SEARCH_LIMIT: usize = 3;
/// Default `SearXNG` endpoint.
const DEFAULT_SEARCH_URL: &str = "http://localhost:8888";
/// Default cap on extracted page text, in characters.
const DEFAULT_EXTRACT_MAX_CHARS: usize = 12_000;

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model for cache-key derivation.
    pub keyer_model: String,
    /// Model for sufficiency evaluation.
    pub planner_model: String,
    /// Model for query reformulation.
    pub reformulator_model: String,
    /// Model for the final answer.
    pub synthesizer_model: String,
    /// Maximum tokens for the JSON call sites.
    pub json_max_tokens: u32,
    /// Maximum tokens for synthesizer responses.
    pub synthesizer_max_tokens: u32,
    /// Timeout for each reasoning call.
    pub timeout: Duration,
    /// Timeout for each search and extraction call.
    pub search_timeout: Duration,
    /// Timeout for each cache read and write.
    pub cache_timeout: Duration,
    /// Maximum search executions per session.
    pub max_iterations: usize,
    /// Base URL of the `SearXNG` instance.
    pub search_url: String,
    /// Number of results requested from search.
    pub search_limit: usize,
    /// Recency filter forwarded to search (`day`, `month`, `year`, or `all`).
    pub time_range: Option<String>,
    /// Maximum characters of extracted page text kept as a candidate.
    pub extract_max_chars: usize,
    /// Directory containing prompt template files.
    ///
    /// Missing files fall back to compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    keyer_model: Option<String>,
    planner_model: Option<String>,
    reformulator_model: Option<String>,
    synthesizer_model: Option<String>,
    json_max_tokens: Option<u32>,
    synthesizer_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    search_timeout: Option<Duration>,
    cache_timeout: Option<Duration>,
    max_iterations: Option<usize>,
    search_url: Option<String>,
    search_limit: Option<usize>,
    time_range: Option<String>,
    extract_max_chars: Option<usize>,
    prompt_dir: Option<PathBuf>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = env_var("QUARRY_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = env_var("OPENAI_API_KEY").or_else(|| env_var("QUARRY_API_KEY"));
        }
        if self.base_url.is_none() {
            self.base_url = env_var("OPENAI_BASE_URL").or_else(|| env_var("QUARRY_BASE_URL"));
        }
        if self.model.is_none() {
            self.model = env_var("QUARRY_MODEL");
        }
        if self.keyer_model.is_none() {
            self.keyer_model = env_var("QUARRY_KEYER_MODEL");
        }
        if self.planner_model.is_none() {
            self.planner_model = env_var("QUARRY_PLANNER_MODEL");
        }
        if self.reformulator_model.is_none() {
            self.reformulator_model = env_var("QUARRY_REFORMULATOR_MODEL");
        }
        if self.synthesizer_model.is_none() {
            self.synthesizer_model = env_var("QUARRY_SYNTHESIZER_MODEL");
        }
        if self.max_iterations.is_none() {
            self.max_iterations = env_parse("QUARRY_MAX_ITERATIONS");
        }
        if self.search_url.is_none() {
            self.search_url = env_var("QUARRY_SEARCH_URL");
        }
        if self.search_limit.is_none() {
            self.search_limit = env_parse("QUARRY_SEARCH_LIMIT");
        }
        if self.time_range.is_none() {
            self.time_range = env_var("QUARRY_TIME_RANGE");
        }
        if self.timeout.is_none() {
            self.timeout = env_parse("QUARRY_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.cache_timeout.is_none() {
            self.cache_timeout = env_parse("QUARRY_CACHE_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = env_var("QUARRY_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model used by every call site without a specific override.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the cache-key model.
    #[must_use]
    pub fn keyer_model(mut self, model: impl Into<String>) -> Self {
        self.keyer_model = Some(model.into());
        self
    }

    /// Sets the sufficiency model.
    #[must_use]
    pub fn planner_model(mut self, model: impl Into<String>) -> Self {
        self.planner_model = Some(model.into());
        self
    }

    /// Sets the reformulation model.
    #[must_use]
    pub fn reformulator_model(mut self, model: impl Into<String>) -> Self {
        self.reformulator_model = Some(model.into());
        self
    }

    /// Sets the synthesizer model.
    #[must_use]
    pub fn synthesizer_model(mut self, model: impl Into<String>) -> Self {
        self.synthesizer_model = Some(model.into());
        self
    }

    /// Sets the max tokens for the JSON call sites.
    #[must_use]
    pub const fn json_max_tokens(mut self, n: u32) -> Self {
        self.json_max_tokens = Some(n);
        self
    }

    /// Sets the synthesizer max tokens.
    #[must_use]
    pub const fn synthesizer_max_tokens(mut self, n: u32) -> Self {
        self.synthesizer_max_tokens = Some(n);
        self
    }

    /// Sets the reasoning request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the search and extraction timeout.
    #[must_use]
    pub const fn search_timeout(mut self, duration: Duration) -> Self {
        self.search_timeout = Some(duration);
        self
    }

    /// Sets the cache read and write timeout.
    #[must_use]
    pub const fn cache_timeout(mut self, duration: Duration) -> Self {
        self.cache_timeout = Some(duration);
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub const fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the `SearXNG` base URL.
    #[must_use]
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = Some(url.into());
        self
    }

    /// Sets the number of search results requested.
    #[must_use]
    pub const fn search_limit(mut self, n: usize) -> Self {
        self.search_limit = Some(n);
        self
    }

    /// Sets the recency filter.
    #[must_use]
    pub fn time_range(mut self, range: impl Into<String>) -> Self {
        self.time_range = Some(range.into());
        self
    }

    /// Sets the extracted text cap.
    #[must_use]
    pub const fn extract_max_chars(mut self, n: usize) -> Self {
        self.extract_max_chars = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            keyer_model: self.keyer_model.unwrap_or_else(|| model.clone()),
            planner_model: self.planner_model.unwrap_or_else(|| model.clone()),
            reformulator_model: self.reformulator_model.unwrap_or_else(|| model.clone()),
            synthesizer_model: self.synthesizer_model.unwrap_or(model),
            json_max_tokens: self.json_max_tokens.unwrap_or(DEFAULT_JSON_MAX_TOKENS),
            synthesizer_max_tokens: self
                .synthesizer_max_tokens
                .unwrap_or(DEFAULT_SYNTHESIZER_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            search_timeout: self
                .search_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS)),
            cache_timeout: self
                .cache_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TIMEOUT_SECS)),
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            search_url: self
                .search_url
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            search_limit: self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1),
            time_range: self.time_range,
            extract_max_chars: self.extract_max_chars.unwrap_or(DEFAULT_EXTRACT_MAX_CHARS),
            prompt_dir: self.prompt_dir,
        })
    }
}
