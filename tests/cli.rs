//! Binary-level tests that need no network access.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quarry() -> Command {
    let mut cmd = Command::cargo_bin("quarry").unwrap_or_else(|_| unreachable!());
    cmd.env_remove("RUST_LOG")
        .env_remove("QUARRY_CACHE_PATH")
        .env_remove("QUARRY_PROMPT_DIR");
    cmd
}

#[test]
fn graph_lists_stages() {
    quarry()
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("start -> check_cache"))
        .stdout(predicate::str::contains("search_execution -> planning"));
}

#[test]
fn ask_without_api_key_fails() {
    quarry()
        .env_remove("OPENAI_API_KEY")
        .env_remove("QUARRY_API_KEY")
        .args(["--no-cache-file", "ask", "capital of laos"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));
}

#[test]
fn repl_hints_on_blank_line_and_quits() {
    quarry()
        .env("OPENAI_API_KEY", "test")
        .arg("--no-cache-file")
        .write_stdin("\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Please enter a question, or q to quit.",
        ))
        .stdout(predicate::str::contains("Input : ").count(2));
}

#[test]
fn init_prompts_writes_templates() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let target = dir.path().join("prompts");

    quarry()
        .arg("init-prompts")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 prompt template(s)"));

    for name in ["keyer.md", "planner.md", "reformulator.md", "synthesizer.md"] {
        assert!(target.join(name).exists(), "{name} missing");
    }
}

#[test]
fn cache_list_on_missing_file_is_empty() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());

    quarry()
        .arg("--cache-path")
        .arg(dir.path().join("none.json"))
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout("No cached entries.\n");
}
