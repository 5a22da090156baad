//! Web search and page extraction.
//!
//! Two external capabilities sit behind traits: [`SearchBackend`] returns
//! ranked hits for a query, [`ContentExtractor`] turns a URL into readable
//! text. [`SearchExecutor`] combines them into one [`Candidate`] per
//! iteration and reports failures as [`ToolError`].

pub mod executor;
pub mod extract;
pub mod searxng;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

pub use executor::SearchExecutor;
pub use extract::HttpExtractor;
pub use searxng::SearxngBackend;

/// One ranked search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Short excerpt shown by the search engine.
    pub snippet: String,
}

/// Candidate information gathered by one search iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Extracted page text, or the result snippet.
    pub text: String,
    /// Source title.
    pub title: String,
    /// Source URL.
    pub url: String,
}

impl Candidate {
    /// True when the iteration produced nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.url.trim().is_empty()
    }
}

/// Web search capability.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Runs `query` and returns at most `limit` hits, best first.
    ///
    /// `time_range` is a recency filter such as `"day"`, `"month"`, or
    /// `"year"`; `None` or `"all"` means unrestricted.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] on transport, status, or decoding failures.
    async fn search(
        &self,
        query: &str,
        time_range: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ToolError>;
}

/// Page content extraction capability.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetches `url` and returns its readable text, labelled with `title`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] on transport, status, or decoding failures.
    async fn extract(&self, url: &str, title: &str) -> Result<String, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_is_empty() {
        assert!(Candidate::default().is_empty());
        assert!(
            Candidate {
                text: "  \n".to_string(),
                ..Candidate::default()
            }
            .is_empty()
        );
        assert!(
            !Candidate {
                url: "https://example.org".to_string(),
                ..Candidate::default()
            }
            .is_empty()
        );
    }
}
