//! CLI layer for quarry.
//!
//! Provides the command-line interface using clap: an interactive REPL,
//! one-shot questions, and cache inspection.

pub mod commands;
pub mod output;
pub mod parser;
pub mod repl;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{CacheCommands, Cli, Commands};
