//! Tests for `kindle activate`.

use crate::support::*;
use std::fs;

const SNIPPET_DIR: &str = ".local/state/kindle/shell";

/// A host whose config binds `openai_key` and whose store holds the `ai`
/// bundle sealed for itself only.
fn sealed_host(label: &str, body: &str) -> Test {
    let t = Test::host(label);
    t.write_config(label, &t.store_dir(), body);
    write_policy(&t.store_dir(), &[t.public_key().as_str()]);

    let output = t.seal("ai", "OPENAI_API_KEY", &format!("{}\n", OPENAI_VALUE));
    assert_success(&output);
    t
}

#[test]
fn test_recipient_host_materializes_and_integrates() {
    let t = sealed_host("a", OPENAI_FISH);

    let output = t.activate();
    assert_success(&output);
    assert_stdout_contains(&output, "materialized 1 secret(s)");
    assert_stdout_contains(&output, "activated");
    assert_output_excludes(&output, OPENAI_VALUE);

    let secret = t.home_path(".secrets/openai_key");
    assert_eq!(fs::read_to_string(&secret).unwrap(), OPENAI_VALUE);
    assert_mode(&secret, 0o600);
    assert_mode(&t.home_path(".secrets"), 0o700);

    let snippet = fs::read_to_string(t.home_path(SNIPPET_DIR).join("init.fish")).unwrap();
    assert!(snippet.contains("set -gx OPENAI_API_KEY"));
    assert!(snippet.contains(&secret.display().to_string()));
    assert!(!snippet.contains(OPENAI_VALUE));

    let entry = fs::read_to_string(t.home_path(".config/fish/config.fish")).unwrap();
    assert!(entry.contains("# >>> kindle >>>"));
    assert!(entry.contains("init.fish"));
}

#[test]
fn test_non_recipient_host_aborts() {
    let a = sealed_host("a", OPENAI_FISH);
    let b = Test::host("b");
    b.write_config("b", &a.store_dir(), OPENAI_FISH);

    let output = b.activate();
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    assert_stderr_contains(&output, "[secrets]");
    assert_stderr_contains(&output, "bundle 'ai'");
    assert_stderr_contains(&output, "not a recipient");

    assert!(!b.home_path(".secrets/openai_key").exists());
    assert!(!b.home_path(SNIPPET_DIR).join("init.fish").exists());
}

#[test]
fn test_second_activation_is_byte_identical() {
    let t = sealed_host("a", OPENAI_ALL_SHELLS);
    assert_success(&t.activate());

    let files = [
        ".secrets/openai_key",
        ".local/state/kindle/shell/init.fish",
        ".local/state/kindle/shell/init.nu",
        ".local/state/kindle/shell/init.zsh",
        ".local/state/kindle/shell/init.bash",
        ".config/fish/config.fish",
        ".config/nushell/config.nu",
        ".zshrc",
        ".bashrc",
    ];
    let before: Vec<Vec<u8>> = files
        .iter()
        .map(|f| fs::read(t.home_path(f)).unwrap())
        .collect();

    let output = t.activate();
    assert_success(&output);
    let out = stdout(&output);
    assert!(!out.contains("now sources"), "second run rewrote an entrypoint: {}", out);

    let after: Vec<Vec<u8>> = files
        .iter()
        .map(|f| fs::read(t.home_path(f)).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_user_config_is_preserved() {
    let t = sealed_host("a", OPENAI_FISH);
    let entry_path = t.home_path(".config/fish/config.fish");
    fs::create_dir_all(entry_path.parent().unwrap()).unwrap();
    fs::write(&entry_path, USER_FISH_CONFIG).unwrap();

    assert_success(&t.activate());
    assert_success(&t.activate());

    let entry = fs::read_to_string(&entry_path).unwrap();
    assert!(entry.starts_with(USER_FISH_CONFIG));
    assert_eq!(entry.matches("# >>> kindle >>>").count(), 1);
    assert_eq!(entry.lines().filter(|l| l.contains("init.fish")).count(), 1);
}

#[test]
fn test_edited_block_is_restored() {
    let t = sealed_host("a", OPENAI_FISH);
    assert_success(&t.activate());

    let entry_path = t.home_path(".config/fish/config.fish");
    let pristine = fs::read_to_string(&entry_path).unwrap();
    let edited = pristine
        .lines()
        .map(|l| if l.contains("init.fish") { "source /tmp/elsewhere.fish" } else { l })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n";
    fs::write(&entry_path, edited).unwrap();

    assert_success(&t.activate());
    assert_eq!(fs::read_to_string(&entry_path).unwrap(), pristine);
}

#[test]
fn test_missing_bundle_names_it() {
    let t = Test::host("a");
    t.write_config("a", &t.store_dir(), OPENAI_FISH);

    let output = t.activate();
    assert_failure(&output);
    assert_stderr_contains(&output, "[secrets]");
    assert_stderr_contains(&output, "bundle 'ai' not found");
}

#[test]
fn test_missing_identity_suggests_init() {
    let t = Test::new();
    t.write_config("a", &t.store_dir(), OPENAI_FISH);

    let output = t.activate();
    assert_failure(&output);
    assert_stderr_contains(&output, "[secrets]");
    assert_stderr_contains(&output, "kindle init");
}

#[test]
fn test_shell_only_config_needs_no_identity() {
    let t = Test::new();
    t.write_config("a", &t.store_dir(), "\n[shell]\ndialects = [\"zsh\"]\n");

    let output = t.activate();
    assert_success(&output);
    assert!(t.home_path(".zshrc").is_file());
    assert!(t.home_path(SNIPPET_DIR).join("init.zsh").is_file());
}

#[test]
fn test_drift_is_reported_but_not_fatal() {
    let t = sealed_host("a", OPENAI_FISH);
    write_policy(&t.store_dir(), &[t.public_key().as_str(), OFFLINE_HOST_KEY]);

    let output = t.activate();
    assert_success(&output);
    assert_stderr_contains(&output, "policy drift on bundle 'ai'");
    assert_stderr_contains(&output, "activated with 1 warning(s)");
    assert!(t.home_path(".secrets/openai_key").is_file());
}

#[cfg(unix)]
#[test]
fn test_symlinked_entrypoint_is_written_through() {
    let t = Test::new();
    t.write_config("a", &t.store_dir(), "\n[shell]\ndialects = [\"bash\"]\n");

    let real = t.dir.path().join("dotfiles/bashrc");
    fs::create_dir_all(real.parent().unwrap()).unwrap();
    fs::write(&real, "alias g=git\n").unwrap();
    std::os::unix::fs::symlink(&real, t.home_path(".bashrc")).unwrap();

    assert_success(&t.activate());

    let link = fs::symlink_metadata(t.home_path(".bashrc")).unwrap();
    assert!(link.file_type().is_symlink());
    let contents = fs::read_to_string(&real).unwrap();
    assert!(contents.starts_with("alias g=git\n"));
    assert!(contents.contains("init.bash"));
}

#[cfg(unix)]
#[test]
fn test_links_stage_and_conflict() {
    let t = Test::new();
    let source = t.dir.path().join("dotfiles/nvim");
    fs::create_dir_all(&source).unwrap();
    let body = format!(
        "\n[[links]]\nsource = '{}'\ntarget = '~/.config/nvim'\n",
        source.display()
    );
    t.write_config("a", &t.store_dir(), &body);

    assert_success(&t.activate());
    assert_eq!(fs::read_link(t.home_path(".config/nvim")).unwrap(), source);

    fs::write(t.home_path(".gitconfig"), "[user]\n").unwrap();
    let body = format!(
        "{}\n[[links]]\nsource = '{}'\ntarget = '~/.gitconfig'\n",
        body,
        source.display()
    );
    t.write_config("a", &t.store_dir(), &body);

    let output = t.activate();
    assert_failure(&output);
    assert_stderr_contains(&output, "[links]");
    assert_stderr_contains(&output, "refusing to replace it");
    assert_eq!(fs::read_to_string(t.home_path(".gitconfig")).unwrap(), "[user]\n");
}
