//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific SDK calls. The orchestrator holds exactly one
//! provider handle and lends it to every agent.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// Trait for LLM provider backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures or transport errors.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}
