//! Integration tests for the `siren` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling without requiring a live backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `siren` binary with env isolation.
///
/// Clears all `SIREN_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn siren_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("siren");
    cmd.env("HOME", "/tmp/siren-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/siren-cli-test-nonexistent")
        .env_remove("SIREN_BACKEND")
        .env_remove("SIREN_OUTPUT")
        .env_remove("SIREN_INSECURE")
        .env_remove("SIREN_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = siren_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("Usage"),
        "Expected 'Usage' in output:\n{text}"
    );
}

#[test]
fn test_help_flag() {
    siren_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("alarm")
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("alarms"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    siren_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("siren"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    siren_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    siren_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = siren_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_alarms_list_no_backend() {
    let output = siren_cmd().args(["alarms", "list"]).output().unwrap();
    assert_eq!(
        output.status.code(),
        Some(2),
        "Expected usage exit code without a backend"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("backend") || text.contains("SIREN_BACKEND"),
        "Expected error pointing at backend configuration:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = siren_cmd()
        .args(["--output", "invalid", "alarms", "list"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_backend_url() {
    let output = siren_cmd()
        .args(["--backend", "not a url", "alarms", "stats"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid URL"),
        "Expected URL validation error:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse; the failure should be about the missing
    // backend, not about argument parsing.
    let output = siren_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--insecure",
            "--timeout",
            "60",
            "alarms",
            "list",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("backend"),
        "Expected backend configuration error:\n{text}"
    );
}

// ── Config file ─────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` renders the defaults even when no file exists.
    siren_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_set_then_show() {
    let dir = tempfile::tempdir().unwrap();

    siren_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "backend", "http://telemetry:8080"])
        .assert()
        .success();

    siren_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://telemetry:8080"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let output = siren_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "nonsense", "42"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("unknown key"),
        "Expected unknown-key error:\n{text}"
    );
}

#[test]
fn test_config_file_backend_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("siren");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "backend = \"http://127.0.0.1:1\"\n",
    )
    .unwrap();

    // Nothing listens on port 1, so reaching the dispatch proves the
    // config file was picked up.
    let output = siren_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["alarms", "stats"])
        .output()
        .unwrap();
    assert_eq!(
        output.status.code(),
        Some(7),
        "Expected connection exit code"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("127.0.0.1:1"),
        "Expected backend URL from config file in error:\n{text}"
    );
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_alarms_subcommands_exist() {
    siren_cmd()
        .args(["alarms", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("ack"))
                .and(predicate::str::contains("clear"))
                .and(predicate::str::contains("stats")),
        );
}

#[test]
fn test_watch_help() {
    siren_cmd()
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reconnect-delay"));
}

#[test]
fn test_ack_requires_id() {
    siren_cmd().args(["alarms", "ack"]).assert().failure();
}
