//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::format_push_string)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::RegexBuilder;

use crate::agent::{AgentConfig, Orchestrator, Stage, create_provider};
use crate::cache::{CacheStore, JsonFileStore, MemoryStore};
use crate::cli::output::{
    OutputFormat, format_entry, format_entry_list, format_missing_key, format_report,
};
use crate::cli::parser::{CacheCommands, Cli, Commands};
use crate::cli::repl;
use crate::error::{CommandError, Result};
use crate::search::{HttpExtractor, SearchExecutor, SearxngBackend};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success. The REPL writes to stdout as it
/// goes and returns an empty string.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match cli.command.as_ref().unwrap_or(&Commands::Repl) {
        Commands::Repl => cmd_repl(cli, format),
        Commands::Ask { query } => cmd_ask(cli, query, format),
        Commands::Cache(CacheCommands::Get { key }) => cmd_cache_get(cli, key, format),
        Commands::Cache(CacheCommands::List { grep }) => {
            cmd_cache_list(cli, grep.as_deref(), format)
        }
        Commands::Graph => Ok(cmd_graph(format)),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Resolves agent configuration: CLI flags, then environment, then defaults.
fn build_config(cli: &Cli) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder();
    if let Some(n) = cli.max_iterations {
        builder = builder.max_iterations(n);
    }
    if let Some(range) = &cli.time_range {
        builder = builder.time_range(range.clone());
    }
    if let Some(url) = &cli.search_url {
        builder = builder.search_url(url.clone());
    }
    if let Some(dir) = &cli.prompt_dir {
        builder = builder.prompt_dir(dir.clone());
    }

    let config = builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}"))
    })?;
    Ok(config)
}

fn open_store(cli: &Cli) -> Arc<dyn CacheStore> {
    if cli.no_cache_file {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(cli.get_cache_path()))
    }
}

/// Wires provider, cache, and search into an orchestrator.
fn build_orchestrator(cli: &Cli) -> Result<Orchestrator> {
    let config = build_config(cli)?;

    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;

    let backend = SearxngBackend::new(&config.search_url, config.search_timeout)
        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
    let extractor = HttpExtractor::new(config.search_timeout, config.extract_max_chars)
        .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
    let searcher = SearchExecutor::new(
        Arc::new(backend),
        Arc::new(extractor),
        config.search_limit,
        config.search_timeout,
    );

    Ok(Orchestrator::new(provider, open_store(cli), searcher, config))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn cmd_repl(cli: &Cli, format: OutputFormat) -> Result<String> {
    let orchestrator = build_orchestrator(cli)?;
    let rt = runtime()?;

    rt.block_on(async {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        repl::run(&orchestrator, stdin, &mut stdout, format).await
    })?;

    Ok(String::new())
}

fn cmd_ask(cli: &Cli, query: &str, format: OutputFormat) -> Result<String> {
    let orchestrator = build_orchestrator(cli)?;
    let rt = runtime()?;

    let report = rt
        .block_on(orchestrator.run_query(query))
        .map_err(|e| CommandError::ExecutionFailed(format!("Query failed: {e}")))?;

    Ok(format_report(&report, format))
}

fn cmd_cache_get(cli: &Cli, key: &str, format: OutputFormat) -> Result<String> {
    let store = JsonFileStore::new(cli.get_cache_path());
    let rt = runtime()?;
    let key = crate::agent::keyer::normalize_key(key);

    Ok(match rt.block_on(store.get(&key)) {
        Some(entry) => format_entry(&key, &entry, format),
        None => format_missing_key(&key, format),
    })
}

fn cmd_cache_list(cli: &Cli, pattern: Option<&str>, format: OutputFormat) -> Result<String> {
    let filter = pattern
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| CommandError::ExecutionFailed(format!("Invalid pattern: {e}")))
        })
        .transpose()?;

    let store = JsonFileStore::new(cli.get_cache_path());
    let rt = runtime()?;
    let mut entries = rt.block_on(store.entries());
    if let Some(re) = &filter {
        entries.retain(|(key, _)| re.is_match(key));
    }

    Ok(format_entry_list(&entries, format))
}

fn cmd_graph(format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => Stage::diagram(),
        OutputFormat::Json | OutputFormat::Ndjson => {
            let edges: Vec<serde_json::Value> = Stage::ALL
                .iter()
                .flat_map(|from| {
                    from.successors()
                        .map(move |to| serde_json::json!({ "from": from, "to": to }))
                })
                .collect();
            format.to_json(&serde_json::json!({ "start": Stage::CheckCache, "edges": edges }))
        }
    }
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    use crate::agent::prompt::PromptSet;

    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit these files to customize agent system prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quarry").chain(args.iter().copied()))
            .unwrap_or_else(|_| unreachable!())
    }

    fn seeded_cache() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{"items": {
                "laos capital": {"answer": "Vientiane", "title": "Laos", "url": "https://example.org/laos"},
                "thailand capital": "Bangkok"
            }}"#,
        )
        .unwrap_or_else(|_| unreachable!());
        (dir, path)
    }

    #[test]
    fn test_graph_text() {
        let output = cmd_graph(OutputFormat::Text);
        assert!(output.contains("check_cache -> planning"));
        assert!(output.contains("final_answer -> terminal"));
    }

    #[test]
    fn test_graph_json() {
        let output = cmd_graph(OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap_or_default();
        assert_eq!(value["start"], "check_cache");
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(7));
    }

    #[test]
    fn test_cache_get_normalizes_key() {
        let (_dir, path) = seeded_cache();
        let path = path.to_string_lossy().into_owned();
        let output = execute(&cli(&["--cache-path", &path, "cache", "get", "  Laos   CAPITAL "]))
            .unwrap_or_default();
        assert!(output.contains("Vientiane"));
        assert!(output.contains("https://example.org/laos"));
    }

    #[test]
    fn test_cache_get_missing() {
        let (_dir, path) = seeded_cache();
        let path = path.to_string_lossy().into_owned();
        let output =
            execute(&cli(&["--cache-path", &path, "cache", "get", "nope"])).unwrap_or_default();
        assert!(output.contains("No cached entry"));
    }

    #[test]
    fn test_cache_list_with_filter() {
        let (_dir, path) = seeded_cache();
        let path = path.to_string_lossy().into_owned();

        let all = execute(&cli(&["--cache-path", &path, "cache", "list"])).unwrap_or_default();
        assert!(all.contains("laos capital"));
        assert!(all.contains("thailand capital"));

        let some = execute(&cli(&["--cache-path", &path, "cache", "list", "--grep", "^LAOS"]))
            .unwrap_or_default();
        assert!(some.contains("laos capital"));
        assert!(!some.contains("thailand"));
    }

    #[test]
    fn test_cache_list_bad_pattern() {
        let (_dir, path) = seeded_cache();
        let path = path.to_string_lossy().into_owned();
        let result = execute(&cli(&["--cache-path", &path, "cache", "list", "--grep", "("]));
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_list_json_round_trips_entries() {
        let (_dir, path) = seeded_cache();
        let path = path.to_string_lossy().into_owned();
        let output = execute(&cli(&["--cache-path", &path, "--format", "json", "cache", "list"]))
            .unwrap_or_default();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap_or_default();
        assert_eq!(entries.len(), 2);
        let thailand = entries
            .iter()
            .find(|e| e["key"] == "thailand capital")
            .cloned()
            .unwrap_or_default();
        let entry: CacheEntry = serde_json::from_value(thailand).unwrap_or_default();
        assert_eq!(entry.answer, "Bangkok");
    }

    #[test]
    fn test_init_prompts() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let target = dir.path().join("prompts");

        let output = cmd_init_prompts(Some(&target), OutputFormat::Text).unwrap_or_default();
        assert!(output.contains("Wrote 4 prompt template(s)"));
        assert!(target.join("planner.md").exists());

        let again = cmd_init_prompts(Some(&target), OutputFormat::Text).unwrap_or_default();
        assert!(again.contains("already exist"));
    }
}
