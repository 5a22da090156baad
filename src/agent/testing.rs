//! Test doubles for the reasoning, search, and extraction capabilities.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse, Role, TokenUsage};
use super::provider::LlmProvider;
use crate::cache::{CacheEntry, CacheStore, MemoryStore};
use crate::error::{AgentError, CacheError, ToolError};
use crate::search::{ContentExtractor, SearchBackend, SearchHit};

/// Phrase identifying the keyer's system prompt.
pub const KEYER: &str = "cache indexer";
/// Phrase identifying the planner's system prompt.
pub const PLANNER: &str = "sufficiency judge";
/// Phrase identifying the reformulator's system prompt.
pub const REFORMULATOR: &str = "search query generator";
/// Phrase identifying the synthesizer's system prompt.
pub const SYNTHESIZER: &str = "answer generator";

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// Provider that answers by matching a phrase in the system prompt.
///
/// Each route replays its scripted replies in order and then repeats the
/// last one. Requests that match no route fail.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    routes: Vec<(String, Vec<Reply>)>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<String, Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts text replies for prompts containing `needle`.
    #[must_use]
    pub fn on(mut self, needle: &str, replies: &[&str]) -> Self {
        let replies = replies.iter().map(|r| Reply::Text((*r).to_string())).collect();
        self.routes.push((needle.to_string(), replies));
        self
    }

    /// Makes every call for `needle` fail.
    #[must_use]
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.routes.push((needle.to_string(), vec![Reply::Fail]));
        self
    }

    /// Delays every reply.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls routed to `needle`.
    pub fn calls_for(&self, needle: &str) -> usize {
        self.payloads_for(needle).len()
    }

    /// User payloads of the calls routed to `needle`, oldest first.
    pub fn payloads_for(&self, needle: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(needle)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let system = request
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let user = request
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let Some((needle, replies)) = self
            .routes
            .iter()
            .find(|(needle, _)| system.contains(needle.as_str()))
        else {
            return Err(AgentError::ApiRequest {
                message: "no scripted route".to_string(),
                status: None,
            });
        };

        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            let seen = calls.entry(needle.clone()).or_default();
            seen.push(user);
            seen.len() - 1
        };

        match replies.get(index).or_else(|| replies.last()) {
            Some(Reply::Text(content)) => Ok(ChatResponse {
                content: content.clone(),
                usage: TokenUsage::default(),
                finish_reason: Some("stop".to_string()),
            }),
            Some(Reply::Fail) | None => Err(AgentError::ApiRequest {
                message: "scripted failure".to_string(),
                status: Some(500),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SearchCall {
    query: String,
    time_range: Option<String>,
    limit: usize,
}

/// Search backend returning the same hits for every query.
#[derive(Debug, Clone, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    fail: bool,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<SearchCall>>>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.query.clone()).collect()
    }

    pub fn last_time_range(&self) -> Option<String> {
        self.lock().last().and_then(|c| c.time_range.clone())
    }

    pub fn last_limit(&self) -> Option<usize> {
        self.lock().last().map(|c| c.limit)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SearchCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SearchBackend for StaticSearch {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search(
        &self,
        query: &str,
        time_range: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ToolError> {
        self.lock().push(SearchCall {
            query: query.to_string(),
            time_range: time_range.map(str::to_string),
            limit,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ToolError::Status {
                tool: "search",
                status: 503,
            });
        }
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}

/// Extractor returning fixed text, or failing.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    text: Option<String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl StaticExtractor {
    pub fn ok(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn urls(&self) -> Vec<String> {
        self.lock().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ContentExtractor for StaticExtractor {
    async fn extract(&self, url: &str, title: &str) -> Result<String, ToolError> {
        self.lock().push((url.to_string(), title.to_string()));
        self.text.clone().ok_or_else(|| ToolError::Request {
            tool: "extract",
            message: "connection refused".to_string(),
        })
    }
}

/// Memory-backed cache store whose reads and writes can be made slow.
#[derive(Debug, Default)]
pub struct SlowStore {
    inner: MemoryStore,
    get_delay: Option<Duration>,
    put_delay: Option<Duration>,
}

impl SlowStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn slow_get(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    #[must_use]
    pub const fn slow_put(mut self, delay: Duration) -> Self {
        self.put_delay = Some(delay);
        self
    }

    pub fn stored_count(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl CacheStore for SlowStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.put(key, entry).await
    }

    async fn entries(&self) -> Vec<(String, CacheEntry)> {
        self.inner.entries().await
    }
}
