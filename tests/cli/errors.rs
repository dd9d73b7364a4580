//! Tests for error handling and CLI flags.

use crate::support::*;

#[test]
fn test_help() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "activate");
    assert_stdout_contains(&output, "reseal");
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("unknown-command").output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "kindle");
}

#[test]
fn test_completions() {
    let t = Test::new();

    for shell in ["bash", "zsh", "fish", "power-shell"] {
        let output = t.cmd().args(["completions", shell]).output().unwrap();
        assert_success(&output);
        assert_stdout_contains(&output, "kindle");
    }
}

#[test]
fn test_missing_config_fails() {
    let t = Test::new();

    let output = t.activate();
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    assert_stderr_contains(&output, "config not found");
}

#[test]
fn test_invalid_config_names_file() {
    let t = Test::new();
    t.write_config(
        "atlas",
        &t.store_dir(),
        "\n[shell]\ndialects = [\"tcsh\"]\n",
    );

    let output = t.activate();
    assert_failure(&output);
    assert_stderr_contains(&output, "kindle.toml");
}

#[test]
fn test_duplicate_binding_rejected() {
    let t = Test::new();
    let body = format!("{}{}", OPENAI_FISH.replace("[shell]\ndialects = [\"fish\"]\n", ""), OPENAI_FISH);
    t.write_config("atlas", &t.store_dir(), &body);

    let output = t.activate();
    assert_failure(&output);
    assert_stderr_contains(&output, "duplicate secret binding: openai_key");
}
