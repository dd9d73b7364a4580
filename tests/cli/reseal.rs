//! Tests for `kindle reseal`.

use crate::support::*;
use std::fs;

#[test]
fn test_policy_drift_scenario() {
    let a = Test::host("a");
    let b = Test::host("b");
    let c = Test::host("c");
    let store = a.store_dir();

    for (t, label) in [(&a, "a"), (&b, "b"), (&c, "c")] {
        t.write_config(label, &store, OPENAI_FISH);
    }
    let (ka, kb, kc) = (a.public_key(), b.public_key(), c.public_key());

    // Sealed for {A, B}.
    write_policy(&store, &[ka.as_str(), kb.as_str()]);
    assert_success(&a.seal("ai", "OPENAI_API_KEY", OPENAI_VALUE));
    assert_success(&b.activate());

    // Policy widened to {A, B, C} without a re-seal.
    write_policy(&store, &[ka.as_str(), kb.as_str(), kc.as_str()]);

    let output = c.activate();
    assert_failure(&output);
    assert_stderr_contains(&output, "[secrets]");
    assert_stderr_contains(&output, "bundle 'ai'");

    let before = fs::read(store.join("ai.json")).unwrap();
    let output = a.reseal_dry_run();
    assert_success(&output);
    assert_stdout_contains(&output, "ai");
    assert_stdout_contains(&output, &kc);
    assert_eq!(fs::read(store.join("ai.json")).unwrap(), before, "dry run must not write");

    let output = a.reseal();
    assert_success(&output);
    assert_stdout_contains(&output, "re-sealed ai");

    assert_success(&c.activate());
    assert_eq!(
        fs::read_to_string(c.home_path(".secrets/openai_key")).unwrap(),
        OPENAI_VALUE
    );

    let output = a.reseal_dry_run();
    assert_success(&output);
    assert_stdout_contains(&output, "all bundles match the policy");
}

#[test]
fn test_reseal_removes_revoked_host() {
    let a = Test::host("a");
    let b = Test::host("b");
    let store = a.store_dir();
    a.write_config("a", &store, OPENAI_FISH);
    b.write_config("b", &store, OPENAI_FISH);

    write_policy(&store, &[a.public_key().as_str(), b.public_key().as_str()]);
    assert_success(&a.seal("ai", "OPENAI_API_KEY", OPENAI_VALUE));
    assert_success(&b.activate());

    write_policy(&store, &[a.public_key().as_str()]);
    assert_success(&a.reseal());

    let output = b.activate();
    assert_failure(&output);
    assert_stderr_contains(&output, "bundle 'ai'");
}

#[test]
fn test_reseal_by_non_recipient_fails_without_writing() {
    let a = Test::host("a");
    let b = Test::host("b");
    let store = a.store_dir();
    a.write_config("a", &store, "");
    b.write_config("b", &store, "");

    write_policy(&store, &[a.public_key().as_str()]);
    assert_success(&a.seal("ai", "OPENAI_API_KEY", OPENAI_VALUE));
    let before = fs::read(store.join("ai.json")).unwrap();

    write_policy(&store, &[a.public_key().as_str(), b.public_key().as_str()]);
    let output = b.reseal();
    assert_failure(&output);
    assert_eq!(fs::read(store.join("ai.json")).unwrap(), before);
}

#[test]
fn test_reseal_named_bundle_only() {
    let a = Test::host("a");
    let store = a.store_dir();
    a.write_config("a", &store, "");

    write_policy(&store, &[a.public_key().as_str()]);
    assert_success(&a.seal("ai", "K", "v1"));
    assert_success(&a.seal("db", "K", "v2"));
    write_policy(&store, &[a.public_key().as_str(), OFFLINE_HOST_KEY]);

    let output = a.cmd().args(["reseal", "db"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "re-sealed db");

    let output = a.reseal_dry_run();
    assert_stdout_contains(&output, "ai");
    assert!(!stdout(&output).contains("• db"));
}

#[test]
fn test_sweep_skips_bundles_outside_policy() {
    let a = Test::host("a");
    let store = a.store_dir();
    a.write_config("a", &store, "");
    let ka = a.public_key();

    write_policy(&store, &[ka.as_str()]);
    assert_success(&a.seal("ai", "K", "v1"));
    assert_success(&a.seal("legacy", "K", "v2"));
    fs::write(store.join("notes.json"), "{}").unwrap();
    let legacy_before = fs::read(store.join("legacy.json")).unwrap();

    // Only ai is governed now, and it gained a recipient.
    fs::write(
        store.join("policy.toml"),
        format!(
            "[[rules]]\npath = \"^(ai|notes)\\\\.json$\"\nrecipients = [\"{}\", \"{}\"]\n",
            ka, OFFLINE_HOST_KEY
        ),
    )
    .unwrap();

    let output = a.reseal_dry_run();
    assert_success(&output);
    assert_stdout_contains(&output, "• ai");
    assert_stdout_contains(&output, OFFLINE_HOST_KEY);
    assert_stdout_contains(&output, "Skipped");
    assert_stdout_contains(&output, "legacy.json");
    assert_stdout_contains(&output, "• notes");

    let output = a.reseal();
    assert_success(&output);
    assert_stdout_contains(&output, "re-sealed ai");
    assert_stdout_contains(&output, "• legacy");
    assert_eq!(fs::read(store.join("legacy.json")).unwrap(), legacy_before);

    let output = a.reseal_dry_run();
    assert_stdout_contains(&output, "all bundles match the policy");
}
