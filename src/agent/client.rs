//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Creates the shared [`LlmProvider`] handle for the configured provider.
///
/// # Supported Providers
///
/// - `"openai"` (default): OpenAI-compatible APIs via `async-openai`
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config))),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_provider() {
        let config = AgentConfig::builder()
            .api_key("test")
            .provider("openai")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let provider = create_provider(&config);
        assert_eq!(provider.map(|p| p.name()).ok(), Some("openai"));
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = AgentConfig::builder()
            .api_key("test")
            .provider("unknown")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let result = create_provider(&config);
        assert!(matches!(
            result,
            Err(AgentError::UnsupportedProvider { ref name }) if name == "unknown"
        ));
    }
}
