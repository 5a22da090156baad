//! One search iteration: query the backend, read the top result.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{Candidate, ContentExtractor, SearchBackend, SearchHit};
use crate::error::ToolError;

/// Label handed to the extractor when the top hit has no title.
const UNTITLED: &str = "web page content";

/// Runs a search and turns the best hit into a [`Candidate`].
///
/// A clean search with nothing usable yields an empty candidate. A failed
/// or timed-out search or extraction yields an error, so the caller can
/// tell the two apart.
#[derive(Clone)]
pub struct SearchExecutor {
    backend: Arc<dyn SearchBackend>,
    extractor: Arc<dyn ContentExtractor>,
    limit: usize,
    timeout: Duration,
}

impl SearchExecutor {
    /// Creates an executor requesting `limit` hits per search.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        extractor: Arc<dyn ContentExtractor>,
        limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            extractor,
            limit: limit.max(1),
            timeout,
        }
    }

    /// Backend name for logging.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Searches for `query` and reads the top result.
    ///
    /// A hit without a URL contributes its snippet. Zero results or a blank
    /// page yield [`Candidate::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] if the search or the extraction of the top hit
    /// fails or times out.
    pub async fn fetch_best(
        &self,
        query: &str,
        time_range: Option<&str>,
    ) -> Result<Candidate, ToolError> {
        let hits = self.search(query, time_range).await?;

        let Some(top) = hits.into_iter().next() else {
            debug!(query, "search returned no results");
            return Ok(Candidate::default());
        };

        if top.url.is_empty() {
            return Ok(Candidate {
                text: top.snippet.trim().to_string(),
                title: top.title,
                url: String::new(),
            });
        }

        let text = self.read(&top).await?;
        if text.trim().is_empty() {
            debug!(url = %top.url, "extraction was blank");
            return Ok(Candidate::default());
        }

        Ok(Candidate {
            text,
            title: top.title,
            url: top.url,
        })
    }

    async fn search(
        &self,
        query: &str,
        time_range: Option<&str>,
    ) -> Result<Vec<SearchHit>, ToolError> {
        tokio::time::timeout(
            self.timeout,
            self.backend.search(query, time_range, self.limit),
        )
        .await
        .map_err(|_| ToolError::Timeout {
            tool: "search",
            timeout: self.timeout,
        })?
    }

    async fn read(&self, hit: &SearchHit) -> Result<String, ToolError> {
        let title = if hit.title.is_empty() {
            UNTITLED
        } else {
            hit.title.as_str()
        };
        tokio::time::timeout(self.timeout, self.extractor.extract(&hit.url, title))
            .await
            .map_err(|_| ToolError::Timeout {
                tool: "extract",
                timeout: self.timeout,
            })?
    }
}
