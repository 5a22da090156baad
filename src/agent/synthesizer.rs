//! Synthesizer agent for the final answer.
//!
//! Answers the question strictly from the candidate information. With no
//! candidate at all it returns a fixed message instead of calling the model.

use std::time::Duration;

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::build_synthesizer_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Answer when no information was gathered.
pub const NOT_ENOUGH_INFO: &str = "Not enough information was found to answer the question.";

/// Answer when the search budget ran out with no information.
pub const BUDGET_EXHAUSTED: &str = "Reached the maximum number of searches and still do not have enough information to answer the question.";

/// Information the final answer is grounded on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grounding<'a> {
    /// Candidate text.
    pub info: &'a str,
    /// Source title.
    pub title: &'a str,
    /// Source URL.
    pub url: &'a str,
    /// Whether the candidate came from the cache.
    pub from_cache: bool,
    /// Whether the search budget was exhausted.
    pub max_reached: bool,
}

/// Agent that writes the final answer.
pub struct SynthesizerAgent {
    model: String,
    max_tokens: u32,
    timeout: Duration,
    system_prompt: String,
}

impl SynthesizerAgent {
    /// Creates a new synthesizer agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.synthesizer_model.clone(),
            max_tokens: config.synthesizer_max_tokens,
            timeout: config.timeout,
            system_prompt,
        }
    }

    /// Answers `query` from `grounding`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the model call fails. The fixed messages
    /// never fail.
    pub async fn answer(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
        grounding: Grounding<'_>,
    ) -> Result<String, AgentError> {
        if grounding.info.is_empty() {
            return Ok(if grounding.max_reached {
                BUDGET_EXHAUSTED
            } else {
                NOT_ENOUGH_INFO
            }
            .to_string());
        }

        let payload = build_synthesizer_prompt(
            query,
            grounding.info,
            grounding.title,
            grounding.url,
            grounding.from_cache,
        );
        let response = self.execute(provider, &payload).await?;
        Ok(response.content.trim().to_string())
    }
}

#[async_trait]
impl Agent for SynthesizerAgent {
    fn name(&self) -> &'static str {
        "synthesizer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        false
    }

    fn temperature(&self) -> f32 {
        0.1
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
