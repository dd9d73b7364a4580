//! Tests for `kindle seal`.

use crate::support::*;
use std::fs;

fn host_with_policy(label: &str) -> Test {
    let t = Test::host(label);
    t.write_config(label, &t.store_dir(), OPENAI_FISH);
    write_policy(&t.store_dir(), &[t.public_key().as_str()]);
    t
}

#[test]
fn test_seal_writes_bundle_without_plaintext() {
    let t = host_with_policy("a");

    let output = t.seal("ai", "OPENAI_API_KEY", OPENAI_VALUE);
    assert_success(&output);
    assert_stdout_contains(&output, "sealed ai:OPENAI_API_KEY");

    let bundle = fs::read_to_string(t.store_dir().join("ai.json")).unwrap();
    assert!(!bundle.contains(OPENAI_VALUE));
    assert!(bundle.contains("OPENAI_API_KEY"));
    assert!(bundle.contains(&t.public_key()));
    assert!(bundle.contains("-----BEGIN AGE ENCRYPTED FILE-----"));
}

#[test]
fn test_seal_reads_stdin() {
    let t = host_with_policy("a");

    let output = t
        .cmd()
        .args(["seal", "ai", "OPENAI_API_KEY"])
        .write_stdin(format!("{}\n", OPENAI_VALUE))
        .output()
        .unwrap();
    assert_success(&output);

    assert_success(&t.activate());
    assert_eq!(
        fs::read_to_string(t.home_path(".secrets/openai_key")).unwrap(),
        OPENAI_VALUE
    );
}

#[test]
fn test_seal_adds_fields_to_existing_bundle() {
    let t = host_with_policy("a");

    assert_success(&t.seal("ai", "OPENAI_API_KEY", "one"));
    assert_success(&t.seal("ai", "ANTHROPIC_API_KEY", "two"));

    let bundle = fs::read_to_string(t.store_dir().join("ai.json")).unwrap();
    assert!(bundle.contains("OPENAI_API_KEY"));
    assert!(bundle.contains("ANTHROPIC_API_KEY"));
}

#[test]
fn test_seal_without_policy_fails() {
    let t = Test::host("a");
    t.write_config("a", &t.store_dir(), "");

    let output = t.seal("ai", "OPENAI_API_KEY", OPENAI_VALUE);
    assert_failure(&output);
    assert_stderr_contains(&output, "policy not found");
}

#[test]
fn test_seal_rejects_bad_names_and_values() {
    let t = host_with_policy("a");

    assert_failure(&t.seal("../escape", "KEY", "v"));
    assert_failure(&t.seal("ai", "1BAD", "v"));

    let output = t.seal("ai", "KEY", "   ");
    assert_failure(&output);
    assert_stderr_contains(&output, "cannot be empty");
    assert!(!t.store_dir().join("ai.json").exists());
}

#[test]
fn test_seal_rejects_invalid_policy_key() {
    let t = Test::host("a");
    t.write_config("a", &t.store_dir(), "");
    write_policy(&t.store_dir(), &[INVALID_PUBLIC_KEY]);

    let output = t.seal("ai", "KEY", "v");
    assert_failure(&output);
    assert_stderr_contains(&output, INVALID_PUBLIC_KEY);
}

#[test]
fn test_seal_refuses_drifted_bundle() {
    let t = host_with_policy("a");
    assert_success(&t.seal("ai", "OPENAI_API_KEY", "one"));
    let before = fs::read(t.store_dir().join("ai.json")).unwrap();

    write_policy(&t.store_dir(), &[t.public_key().as_str(), OFFLINE_HOST_KEY]);

    let output = t.seal("ai", "OTHER_KEY", "two");
    assert_failure(&output);
    assert_stderr_contains(&output, "policy drift on bundle 'ai'");
    assert_stderr_contains(&output, "kindle reseal");
    assert_eq!(fs::read(t.store_dir().join("ai.json")).unwrap(), before);
}
