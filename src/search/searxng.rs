//! `SearXNG` JSON API backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{SearchBackend, SearchHit};
use crate::error::ToolError;

const TOOL: &str = "search";

/// User agent sent with search and extraction requests.
pub(crate) const USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

/// Search backend for a `SearXNG` instance with the JSON format enabled.
#[derive(Debug, Clone)]
pub struct SearxngBackend {
    client: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Debug, Deserialize)]
struct SearxResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl SearxngBackend {
    /// Creates a backend for the instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Config`] if `base_url` is not an absolute URL or
    /// the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ToolError> {
        let mut base = Url::parse(base_url.trim()).map_err(|e| ToolError::Config {
            tool: TOOL,
            message: format!("invalid search URL {base_url:?}: {e}"),
        })?;

        // Keep any path prefix (e.g. `/searx`) when joining.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("search").map_err(|e| ToolError::Config {
            tool: TOOL,
            message: e.to_string(),
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::Config {
                tool: TOOL,
                message: e.to_string(),
            })?;

        Ok(Self { client, endpoint })
    }

    /// Builds the request URL for `query`.
    fn request_url(&self, query: &str, time_range: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("format", "json");
            if let Some(range) = time_range.map(str::trim)
                && !range.is_empty()
                && !range.eq_ignore_ascii_case("all")
            {
                pairs.append_pair("time_range", range);
            }
        }
        url
    }
}

#[async_trait]
impl SearchBackend for SearxngBackend {
    fn name(&self) -> &'static str {
        "searxng"
    }

    async fn search(
        &self,
        query: &str,
        time_range: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ToolError> {
        let url = self.request_url(query, time_range);
        debug!(%url, limit, "search request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(TOOL, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status {
                tool: TOOL,
                status: status.as_u16(),
            });
        }

        let body: SearxResponse = response.json().await.map_err(|e| ToolError::Decode {
            tool: TOOL,
            message: e.to_string(),
        })?;

        let hits: Vec<SearchHit> = body
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title.unwrap_or_default().trim().to_string(),
                url: r.url.unwrap_or_default().trim().to_string(),
                snippet: r.content.unwrap_or_default().trim().to_string(),
            })
            .filter(|hit| !hit.url.is_empty() || !hit.snippet.is_empty())
            .take(limit)
            .collect();

        debug!(hits = hits.len(), "search complete");
        Ok(hits)
    }
}

/// Maps a transport error, keeping timeouts distinct.
pub(crate) fn request_error(tool: &'static str, e: &reqwest::Error) -> ToolError {
    ToolError::Request {
        tool,
        message: if e.is_timeout() {
            format!("timed out: {e}")
        } else {
            e.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn backend(base: &str) -> SearxngBackend {
        SearxngBackend::new(base, Duration::from_secs(5)).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_request_url_basic() {
        let url = backend("http://localhost:8888").request_url("capital of laos", None);
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "capital of laos".to_string())));
        assert!(pairs.contains(&("format".to_string(), "json".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "time_range"));
    }

    #[test]
    fn test_request_url_keeps_path_prefix() {
        let url = backend("https://example.org/searx").request_url("q", None);
        assert_eq!(url.path(), "/searx/search");
    }

    #[test_case(None, None ; "unset")]
    #[test_case(Some("all"), None ; "all is unrestricted")]
    #[test_case(Some("  "), None ; "blank")]
    #[test_case(Some("year"), Some("year") ; "year")]
    #[test_case(Some("day"), Some("day") ; "day")]
    fn test_request_url_time_range(input: Option<&str>, expected: Option<&str>) {
        let url = backend("http://localhost:8888").request_url("q", input);
        let range = url
            .query_pairs()
            .find(|(k, _)| k == "time_range")
            .map(|(_, v)| v.into_owned());
        assert_eq!(range.as_deref(), expected);
    }

    #[test]
    fn test_new_rejects_relative_url() {
        let result = SearxngBackend::new("localhost", Duration::from_secs(1));
        assert!(matches!(result, Err(ToolError::Config { tool: "search", .. })));
    }

    #[test]
    fn test_response_tolerates_nulls() {
        let body: SearxResponse = serde_json::from_str(
            r#"{"query": "x", "results": [{"title": null, "url": "https://a.example", "content": "snippet"}]}"#,
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(body.results.len(), 1);
        assert!(body.results[0].title.is_none());
    }
}
