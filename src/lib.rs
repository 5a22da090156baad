//! # quarry
//!
//! Cache-first iterative question answering.
//!
//! A question is first looked up in a persistent answer cache under a
//! model-derived key. On a miss, quarry alternates between judging whether
//! the information gathered so far is enough, rewriting the search query
//! with a fresh strategy, and fetching the top web result, for at most a
//! configured number of searches. It then synthesizes an answer grounded in
//! the best text it found and stores that text when the judge considers it
//! worth keeping.
//!
//! ## Modules
//!
//! - [`agent`]: reasoning agents, the stage machine, and the orchestrator
//! - [`cache`]: the persistent answer cache
//! - [`search`]: web search and page extraction
//! - [`cli`]: command-line interface
//! - [`error`]: error types

pub mod agent;
pub mod cache;
pub mod cli;
pub mod error;
pub mod search;

pub use error::{Error, Result};
