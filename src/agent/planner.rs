//! Sufficiency evaluation agent.
//!
//! Judges whether the candidate information answers the question, and
//! whether it is worth remembering.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::AgentConfig;
use super::parse::{bool_field, parse_json_object, str_field};
use super::prompt::build_planner_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// The evaluator's decision for one candidate.
///
/// The default is the conservative answer: not enough, not worth storing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the candidate answers the question.
    pub enough: bool,
    /// What is missing, or why it suffices.
    pub reason: String,
    /// Whether the candidate may be written to the cache.
    pub store_ok: bool,
    /// Why the candidate is or is not worth storing.
    pub value_reason: String,
}

/// Agent that evaluates candidate sufficiency.
pub struct PlannerAgent {
    model: String,
    max_tokens: u32,
    timeout: Duration,
    system_prompt: String,
}

impl PlannerAgent {
    /// Creates a new planner agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.planner_model.clone(),
            max_tokens: config.json_max_tokens,
            timeout: config.timeout,
            system_prompt,
        }
    }

    /// Evaluates the candidate `text` from `title` / `url` against `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the call fails or the response is not a
    /// JSON object. Missing fields read as `false` / empty.
    pub async fn evaluate(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
        text: &str,
        title: &str,
        url: &str,
    ) -> Result<Verdict, AgentError> {
        let payload = build_planner_prompt(query, text, title, url);
        let response = self.execute(provider, &payload).await?;
        let map = parse_json_object(&response.content)?;
        Ok(Verdict {
            enough: bool_field(&map, "enough"),
            reason: str_field(&map, "reason"),
            store_ok: bool_field(&map, "store_ok"),
            value_reason: str_field(&map, "value_reason"),
        })
    }
}

#[async_trait]
impl Agent for PlannerAgent {
    fn name(&self) -> &'static str {
        "planner"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::PLANNER_SYSTEM_PROMPT;
    use crate::agent::testing::{PLANNER, ScriptedProvider};
    use serde_json::Value;

    fn agent() -> PlannerAgent {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        PlannerAgent::new(&config, PLANNER_SYSTEM_PROMPT.to_string())
    }

    #[tokio::test]
    async fn test_evaluate_full_verdict() {
        let provider = ScriptedProvider::new().on(
            PLANNER,
            &[r#"{"enough": true, "reason": "names the capital", "store_ok": true, "value_reason": "encyclopedic source"}"#],
        );
        let verdict = agent()
            .evaluate(
                &provider,
                "capital of laos",
                "Vientiane is the capital of Laos.",
                "Laos",
                "https://en.wikipedia.org/wiki/Laos",
            )
            .await
            .unwrap_or_default();
        assert!(verdict.enough);
        assert!(verdict.store_ok);
        assert_eq!(verdict.reason, "names the capital");

        let payload: Value =
            serde_json::from_str(&provider.payloads_for(PLANNER)[0]).unwrap_or(Value::Null);
        assert_eq!(payload["cache_answer"], "Vientiane is the capital of Laos.");
        assert_eq!(payload["url"], "https://en.wikipedia.org/wiki/Laos");
    }

    #[tokio::test]
    async fn test_evaluate_partial_fields_default_false() {
        let provider = ScriptedProvider::new().on(PLANNER, &[r#"{"reason": "off topic"}"#]);
        let verdict = agent()
            .evaluate(&provider, "q", "text", "", "")
            .await
            .unwrap_or_default();
        assert!(!verdict.enough);
        assert!(!verdict.store_ok);
        assert_eq!(verdict.reason, "off topic");
    }

    #[tokio::test]
    async fn test_evaluate_failure_is_error() {
        let provider = ScriptedProvider::new().fail_on(PLANNER);
        let result = agent().evaluate(&provider, "q", "text", "", "").await;
        assert!(matches!(result, Err(AgentError::ApiRequest { .. })));
    }

    #[test]
    fn test_default_verdict_is_conservative() {
        let verdict = Verdict::default();
        assert!(!verdict.enough);
        assert!(!verdict.store_ok);
    }
}
