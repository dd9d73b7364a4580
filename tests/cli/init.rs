//! Tests for `kindle init` and `kindle whoami`.

use crate::support::*;
use std::fs;

#[test]
fn test_init_creates_identity_and_config() {
    let t = Test::new();

    let output = t.init_cmd("atlas");
    assert_success(&output);
    assert_stdout_contains(&output, "generated identity for atlas");
    assert_stdout_contains(&output, "age1");

    let identity = t.home_path(".config/kindle/identity.key");
    assert!(identity.exists(), "identity key should exist");
    assert_mode(&identity, 0o600);

    let config = fs::read_to_string(t.config_path()).unwrap();
    assert!(config.contains("label = \"atlas\""));
}

#[test]
fn test_whoami_prints_label_and_key() {
    let t = Test::host("atlas");

    let output = t.whoami();
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.starts_with("atlas  age1"), "got: {}", out);
}

#[test]
fn test_init_twice_fails_without_force() {
    let t = Test::host("atlas");
    let before = t.public_key();

    let output = t.init_cmd("atlas");
    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");
    assert_eq!(t.public_key(), before);
}

#[test]
fn test_init_force_replaces_key() {
    let t = Test::host("atlas");
    let before = t.public_key();

    let output = t
        .cmd()
        .args(["init", "--label", "atlas", "--force"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_ne!(t.public_key(), before);
}

#[test]
fn test_config_flag_and_env() {
    let t = Test::new();
    let flag_path = t.dir.path().join("flag/kindle.toml");
    let env_path = t.dir.path().join("env/kindle.toml");

    let output = t
        .cmd()
        .arg("--config")
        .arg(&flag_path)
        .args(["init", "--label", "from-flag"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(fs::read_to_string(&flag_path).unwrap().contains("from-flag"));

    // Same HOME, so the identity already exists.
    let output = t
        .cmd()
        .env("KINDLE_CONFIG", &env_path)
        .args(["init", "--label", "from-env", "--force"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(fs::read_to_string(&env_path).unwrap().contains("from-env"));
    assert!(!t.config_path().exists());
}

#[test]
fn test_whoami_without_identity_suggests_init() {
    let t = Test::new();
    t.write_config("atlas", &t.store_dir(), "");

    let output = t.whoami();
    assert_failure(&output);
    assert_stderr_contains(&output, "no private key found");
    assert_stderr_contains(&output, "kindle init");
}
