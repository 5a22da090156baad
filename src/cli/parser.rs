//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default cache file, relative to the working directory.
pub const DEFAULT_CACHE_PATH: &str = ".quarry/cache.json";

/// quarry: cache-first iterative question answering.
///
/// Looks a question up in a local answer cache, and otherwise searches the
/// web, judging after each search whether the collected information is
/// enough to answer.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the answer cache file.
    ///
    /// Defaults to `.quarry/cache.json` in the current directory.
    #[arg(short, long, env = "QUARRY_CACHE_PATH", global = true)]
    pub cache_path: Option<PathBuf>,

    /// Keep the cache in memory only; nothing is read from or written to disk.
    #[arg(long, global = true)]
    pub no_cache_file: bool,

    /// Maximum searches per question (default 10, or `QUARRY_MAX_ITERATIONS`).
    #[arg(long, global = true)]
    pub max_iterations: Option<usize>,

    /// Recency filter for searches: day, week, month, year, or all.
    #[arg(long, global = true)]
    pub time_range: Option<String>,

    /// `SearXNG` base URL (default `http://localhost:8888`, or `QUARRY_SEARCH_URL`).
    #[arg(long, global = true)]
    pub search_url: Option<String>,

    /// Directory containing prompt template files.
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute. Defaults to `repl`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer questions interactively, one per line.
    ///
    /// Enter `q` to quit.
    Repl,

    /// Answer a single question.
    #[command(after_help = r#"Examples:
  quarry ask "What is the capital of Laos?"
  quarry --max-iterations 3 --time-range year ask "latest rust release"
  quarry --format json ask "boiling point of water at 2000m" | jq '.answer'
"#)]
    Ask {
        /// The question.
        query: String,
    },

    /// Inspect the answer cache.
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Print the stage graph.
    Graph,

    /// Write default prompt templates to disk for customization.
    ///
    /// Creates markdown template files in the prompt directory so users
    /// can customize agent system prompts without recompiling.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  quarry init-prompts                 # Write to ~/.config/quarry/prompts/
  quarry init-prompts ./my-prompts    # Write to custom directory
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        ///
        /// Defaults to `~/.config/quarry/prompts/`.
        dir: Option<PathBuf>,
    },
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show the entry stored under a key.
    Get {
        /// Cache key (lowercase keywords).
        key: String,
    },

    /// List cached keys.
    List {
        /// Only list keys matching this regular expression (case-insensitive).
        #[arg(short, long)]
        grep: Option<String>,
    },
}

impl Cli {
    /// Returns the cache path, using the default if not specified.
    #[must_use]
    pub fn get_cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH))
    }
}
