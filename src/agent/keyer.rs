//! Cache-key derivation agent.
//!
//! Condenses a question into a short keyword phrase so that rephrasings of
//! the same question land on the same cache entry.

use std::time::Duration;

use async_trait::async_trait;

use super::config::AgentConfig;
use super::parse::{parse_json_object, str_field};
use super::prompt::build_keyer_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Agent that derives the cache key for a query.
pub struct KeyerAgent {
    model: String,
    max_tokens: u32,
    timeout: Duration,
    system_prompt: String,
}

impl KeyerAgent {
    /// Creates a new keyer agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.keyer_model.clone(),
            max_tokens: config.json_max_tokens,
            timeout: config.timeout,
            system_prompt,
        }
    }

    /// Derives the normalized cache key for `query`.
    ///
    /// An empty key is a valid result and means "do not use the cache".
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the call fails or the response is not a
    /// JSON object.
    pub async fn derive_key(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
    ) -> Result<String, AgentError> {
        let response = self.execute(provider, &build_keyer_prompt(query)).await?;
        let map = parse_json_object(&response.content)?;
        Ok(normalize_key(&str_field(&map, "key")))
    }
}

/// Lowercases and collapses whitespace so equivalent keys compare equal.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Agent for KeyerAgent {
    fn name(&self) -> &'static str {
        "keyer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
