//! quarry binary entry point.

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quarry::cli::{Cli, execute};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = execute(&cli).context("quarry failed")?;
    if !output.is_empty() {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{output}").context("failed to write output")?;
        stdout.flush().context("failed to flush output")?;
    }
    Ok(())
}

/// Logs go to stderr so they never mix with answers on stdout.
fn init_tracing(verbose: bool) {
    let default = if verbose { "quarry=debug" } else { "quarry=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
