//! Readable-text extraction from web pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::ContentExtractor;
use super::searxng::{USER_AGENT, request_error};
use crate::error::ToolError;

const TOOL: &str = "extract";

/// Content containers tried in order before falling back to `<body>`.
const CONTENT_SELECTORS: &[&str] = &["main", "article", "[role=\"main\"]", "#content", "body"];

/// Tags dropped during Markdown conversion.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript", "svg", "form",
];

/// Fetches pages over HTTP and converts them to Markdown text.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: Client,
    max_chars: usize,
}

impl HttpExtractor {
    /// Creates an extractor that keeps at most `max_chars` characters per page.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Config`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self, ToolError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::Config {
                tool: TOOL,
                message: e.to_string(),
            })?;
        Ok(Self { client, max_chars })
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str, title: &str) -> Result<String, ToolError> {
        debug!(url, "fetching page");

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

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let body = response.text().await.map_err(|e| ToolError::Decode {
            tool: TOOL,
            message: e.to_string(),
        })?;

        let text = if content_type.contains("html") {
            html_to_markdown(&body)?
        } else if content_type.starts_with("text/") || content_type.contains("json") {
            body
        } else {
            return Err(ToolError::Decode {
                tool: TOOL,
                message: format!("unsupported content type {content_type}"),
            });
        };

        let text = collapse_blank_lines(&text);
        let text = truncate_graphemes(&text, self.max_chars);
        debug!(url, chars = text.len(), "page extracted");

        if text.trim().is_empty() {
            return Ok(String::new());
        }
        Ok(if title.trim().is_empty() {
            text
        } else {
            format!("# {}\n\n{text}", title.trim())
        })
    }
}

/// Converts the main content of an HTML page to Markdown.
fn html_to_markdown(html: &str) -> Result<String, ToolError> {
    let content = content_html(html);
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();
    converter.convert(&content).map_err(|e| ToolError::Decode {
        tool: TOOL,
        message: format!("html conversion failed: {e}"),
    })
}

/// Selects the first content container, or the whole document.
fn content_html(html: &str) -> String {
    let doc = Html::parse_document(html);
    CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| doc.select(&selector).next().map(|el| el.inner_html()))
        .unwrap_or_else(|| html.to_string())
}

/// Trims lines and keeps at most one blank line between paragraphs.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = true;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            if !blank_run {
                out.push('\n');
            }
            blank_run = true;
        } else {
            out.push_str(line);
            out.push('\n');
            blank_run = false;
        }
    }
    out.trim_end().to_string()
}

/// Keeps at most `max` grapheme clusters.
fn truncate_graphemes(text: &str, max: usize) -> String {
    match text.grapheme_indices(true).nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Laos</title><script>var x = 1;</script></head>
<body>
  <nav><a href="/">Home</a></nav>
  <main>
    <h1>Vientiane</h1>
    <p>Vientiane is the <strong>capital</strong> of Laos.</p>
    <footer>Copyright</footer>
  </main>
</body></html>"#;

    #[test]
    fn test_html_to_markdown_prefers_main() {
        let md = html_to_markdown(PAGE).unwrap_or_default();
        assert!(md.contains("Vientiane is the **capital** of Laos."));
        assert!(!md.contains("Home"));
        assert!(!md.contains("var x"));
        assert!(!md.contains("Copyright"));
    }

    #[test]
    fn test_content_html_falls_back_to_body() {
        let html = "<html><body><p>only body</p></body></html>";
        assert!(content_html(html).contains("only body"));
    }

    #[test]
    fn test_collapse_blank_lines() {
        let text = "\n\n# Title\n\n\n\nfirst   \n\n\nsecond\n\n";
        assert_eq!(collapse_blank_lines(text), "# Title\n\nfirst\n\nsecond");
    }

    #[test]
    fn test_truncate_graphemes_respects_boundaries() {
        assert_eq!(truncate_graphemes("寮國首都", 2), "寮國");
        assert_eq!(truncate_graphemes("e\u{301}tude", 1), "e\u{301}");
        assert_eq!(truncate_graphemes("short", 100), "short");
        assert_eq!(truncate_graphemes("abc", 0), "");
    }
}
