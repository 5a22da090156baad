//! Agentic question answering for quarry.
//!
//! Answers a question from the cache when possible, otherwise runs a
//! bounded loop of search and sufficiency checks before synthesizing an
//! answer. Uses a pluggable provider abstraction backed by
//! OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! User query → Orchestrator
//!   ├── KeyerAgent (derives the cache key) → CacheStore lookup
//!   │   └── hit ─────────────────────────────────────────────┐
//!   ├── loop, at most max_iterations searches:               │
//!   │   ├── PlannerAgent (is the candidate enough?)          │
//!   │   ├── ReformulatorAgent (next query + strategy)        │
//!   │   └── SearchExecutor (search, extract top result)      │
//!   ├── SynthesizerAgent → final answer  ◄──────────────────┘
//!   └── CacheStore write, when the planner approved it
//! ```

pub mod client;
pub mod config;
pub mod keyer;
pub mod message;
pub mod orchestrator;
pub mod parse;
pub mod planner;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod reformulator;
pub mod session;
pub mod synthesizer;
#[cfg(test)]
pub(crate) mod testing;
pub mod traits;

// Re-export key types
pub use client::create_provider;
pub use config::AgentConfig;
pub use keyer::KeyerAgent;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::Orchestrator;
pub use planner::{PlannerAgent, Verdict};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use reformulator::{Reformulation, ReformulatorAgent};
pub use session::{Session, SessionReport, Stage};
pub use synthesizer::SynthesizerAgent;
pub use traits::{Agent, AgentResponse};
