//! Query reformulation agent.
//!
//! Produces the next search query from what is still missing, steering
//! away from strategies already tried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::AgentConfig;
use super::parse::{parse_json_object, str_field};
use super::prompt::build_reformulator_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// A reformulated search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reformulation {
    /// Query to search for. May be empty.
    pub query: String,
    /// Strategy label applied, e.g. `"synonyms"`.
    pub strategy: String,
    /// The agent's restatement of what is missing.
    pub missing_reason: String,
}

/// Agent that rewrites the search query.
pub struct ReformulatorAgent {
    model: String,
    max_tokens: u32,
    timeout: Duration,
    system_prompt: String,
}

impl ReformulatorAgent {
    /// Creates a new reformulator agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.reformulator_model.clone(),
            max_tokens: config.json_max_tokens,
            timeout: config.timeout,
            system_prompt,
        }
    }

    /// Produces the next query for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the call fails or the response is not a
    /// JSON object.
    pub async fn reformulate(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
        missing_reason: &str,
        used_strategies: &[String],
        last_query: &str,
    ) -> Result<Reformulation, AgentError> {
        let payload = build_reformulator_prompt(query, missing_reason, used_strategies, last_query);
        let response = self.execute(provider, &payload).await?;
        let map = parse_json_object(&response.content)?;
        Ok(Reformulation {
            query: str_field(&map, "query"),
            strategy: str_field(&map, "strategy"),
            missing_reason: str_field(&map, "missing_reason"),
        })
    }
}

#[async_trait]
impl Agent for ReformulatorAgent {
    fn name(&self) -> &'static str {
        "reformulator"
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

    // A little variety keeps retries from producing the same query.
    fn temperature(&self) -> f32 {
        0.3
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
