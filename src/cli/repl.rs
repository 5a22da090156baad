//! Line-oriented interactive loop.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use super::output::{OutputFormat, format_report};
use crate::agent::Orchestrator;

/// Prompt shown before each question.
pub const PROMPT: &str = "Input : ";
/// Reply to a blank line.
pub const BLANK_HINT: &str = "Please enter a question, or q to quit.";

/// Reads questions from `input` until `q`, `Q`, or end of input, answering
/// each one on `output`.
///
/// # Errors
///
/// Returns an I/O error if reading `input` or writing `output` fails.
pub async fn run<R, W>(
    orchestrator: &Orchestrator,
    input: R,
    output: &mut W,
    format: OutputFormat,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };
        let query = line.trim();

        if query.eq_ignore_ascii_case("q") {
            break;
        }
        if query.is_empty() {
            writeln!(output, "{BLANK_HINT}")?;
            continue;
        }

        match orchestrator.run_query(query).await {
            Ok(report) => {
                if format == OutputFormat::Text {
                    writeln!(output)?;
                }
                write!(output, "{}", format_report(&report, format))?;
                if format == OutputFormat::Text {
                    writeln!(output)?;
                }
            }
            Err(e) => {
                warn!(error = %e, "query rejected");
                writeln!(output, "Error: {e}. The question was not run.")?;
            }
        }
    }
    Ok(())
}
