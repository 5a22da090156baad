//! Error types for quarry.
//!
//! Each layer has its own `thiserror` enum. Most of them never reach the
//! user: the orchestrator maps reasoning, tool, and cache failures to
//! conservative defaults at the call site. Only configuration problems and
//! malformed input surface through [`Error`].

use std::time::Duration;

use thiserror::Error;

/// Result alias used by the CLI layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent or provider error.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Cache store error.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Command execution error.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O error on the terminal streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the reasoning capability and the agents that call it.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured.
    #[error("API key missing: set OPENAI_API_KEY or QUARRY_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name that was requested.
        name: String,
    },

    /// The provider request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error description from the SDK.
        message: String,
        /// HTTP status, when the SDK exposes one.
        status: Option<u16>,
    },

    /// The provider did not answer within the configured timeout.
    #[error("{agent} call timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Agent whose call timed out.
        agent: &'static str,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The response did not match the expected JSON contract.
    #[error("response parse error: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// Raw response content.
        content: String,
    },

    /// The orchestrator rejected its input.
    #[error("orchestration error: {message}")]
    Orchestration {
        /// What went wrong.
        message: String,
    },
}

/// Failures of the external search and extraction capabilities.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The call exceeded its timeout.
    #[error("{tool} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Tool that timed out (`"search"` or `"extract"`).
        tool: &'static str,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// Transport-level failure.
    #[error("{tool} request failed: {message}")]
    Request {
        /// Tool that failed.
        tool: &'static str,
        /// Error description.
        message: String,
    },

    /// The remote service answered with a non-success status.
    #[error("{tool} returned HTTP {status}")]
    Status {
        /// Tool that failed.
        tool: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("{tool} response could not be decoded: {message}")]
    Decode {
        /// Tool that failed.
        tool: &'static str,
        /// Error description.
        message: String,
    },

    /// The configuration for the tool is invalid (e.g. a bad base URL).
    #[error("{tool} misconfigured: {message}")]
    Config {
        /// Tool that is misconfigured.
        tool: &'static str,
        /// Error description.
        message: String,
    },
}

/// Cache store errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be (de)serialized.
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backing data has an unexpected shape.
    #[error("cache file is corrupt: {message}")]
    Corrupt {
        /// What was wrong with it.
        message: String,
    },

    /// A blocking cache task panicked or was cancelled.
    #[error("cache task failed: {message}")]
    Task {
        /// Join error description.
        message: String,
    },
}

/// CLI command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not run.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be formatted.
    #[error("output format error: {0}")]
    OutputFormat(String),
}
