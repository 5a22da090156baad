//! Output formatting for CLI commands.

#![allow(clippy::format_push_string)]

use serde::Serialize;

use crate::agent::SessionReport;
use crate::cache::CacheEntry;

/// Banner printed before an answer.
pub const ANSWER_BANNER: &str = "===== Answer =====";
/// Banner printed after an answer.
pub const ANSWER_FOOTER: &str = "==================";
/// Printed when a session produced no answer text.
pub const NO_ANSWER: &str = "No answer was produced.";

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// One JSON document per line.
    Ndjson,
}

impl OutputFormat {
    /// Parses a format name. Unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Serializes `value` in this format's JSON flavor.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let rendered = match self {
            Self::Ndjson => serde_json::to_string(value),
            Self::Text | Self::Json => serde_json::to_string_pretty(value),
        };
        let mut out = rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
        out.push('\n');
        out
    }
}

/// Formats a session's answer between banners.
#[must_use]
pub fn format_answer(report: &SessionReport) -> String {
    let answer = report.answer.trim();
    let answer = if answer.is_empty() { NO_ANSWER } else { answer };
    format!("{ANSWER_BANNER}\n{answer}\n{ANSWER_FOOTER}\n")
}

/// Formats a session report in `format`.
#[must_use]
pub fn format_report(report: &SessionReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_answer(report),
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(report),
    }
}

/// Formats one cache entry.
#[must_use]
pub fn format_entry(key: &str, entry: &CacheEntry, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!("key:   {key}\n");
            if !entry.title.is_empty() {
                out.push_str(&format!("title: {}\n", entry.title));
            }
            if !entry.url.is_empty() {
                out.push_str(&format!("url:   {}\n", entry.url));
            }
            out.push('\n');
            out.push_str(entry.answer.trim_end());
            out.push('\n');
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(&serde_json::json!({
            "key": key,
            "answer": entry.answer,
            "title": entry.title,
            "url": entry.url,
        })),
    }
}

/// Formats a list of cache entries, one line each in text mode.
#[must_use]
pub fn format_entry_list(entries: &[(String, CacheEntry)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                return "No cached entries.\n".to_string();
            }
            let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            let mut out = String::new();
            for (key, entry) in entries {
                let source = if entry.url.is_empty() {
                    entry.title.as_str()
                } else {
                    entry.url.as_str()
                };
                out.push_str(&format!("{key:<width$}  {source}\n"));
            }
            let noun = if entries.len() == 1 { "entry" } else { "entries" };
            out.push_str(&format!("\n{} {noun}\n", entries.len()));
            out
        }
        OutputFormat::Json => format.to_json(&entry_values(entries)),
        OutputFormat::Ndjson => entry_values(entries)
            .iter()
            .map(|v| format.to_json(v))
            .collect(),
    }
}

fn entry_values(entries: &[(String, CacheEntry)]) -> Vec<serde_json::Value> {
    entries
        .iter()
        .map(|(key, entry)| {
            serde_json::json!({
                "key": key,
                "answer": entry.answer,
                "title": entry.title,
                "url": entry.url,
            })
        })
        .collect()
}

/// Message for a key with no cached entry.
#[must_use]
pub fn format_missing_key(key: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("No cached entry for key: {key}\n"),
        OutputFormat::Json | OutputFormat::Ndjson => {
            format.to_json(&serde_json::json!({ "key": key, "found": false }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::agent::Session;

    fn report(answer: &str) -> SessionReport {
        let mut session = Session::new("q", 3, None);
        session.answer = answer.to_string();
        session.report(Duration::ZERO)
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("NDJSON"), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("bogus"), OutputFormat::Text);
    }

    #[test]
    fn test_format_answer_banners() {
        let text = format_answer(&report("Vientiane."));
        assert_eq!(text, "===== Answer =====\nVientiane.\n==================\n");
    }

    #[test]
    fn test_format_answer_empty() {
        let text = format_answer(&report("  "));
        assert!(text.contains(NO_ANSWER));
    }

    #[test]
    fn test_format_report_json() {
        let json = format_report(&report("a"), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value["answer"], "a");
        assert_eq!(value["iterations"], 0);
    }

    #[test]
    fn test_format_entry_list() {
        assert_eq!(
            format_entry_list(&[], OutputFormat::Text),
            "No cached entries.\n"
        );
        let entries = vec![(
            "laos capital".to_string(),
            CacheEntry {
                answer: "Vientiane".to_string(),
                title: "Laos".to_string(),
                url: "https://example.org/laos".to_string(),
            },
        )];
        let text = format_entry_list(&entries, OutputFormat::Text);
        assert!(text.contains("laos capital  https://example.org/laos"));
        assert!(text.contains("1 entry"));

        let ndjson = format_entry_list(&entries, OutputFormat::Ndjson);
        assert_eq!(ndjson.lines().count(), 1);
    }
}
