//! Test support utilities for kindle integration tests.
//!
//! Provides isolated hosts and helper commands.

#![allow(dead_code)]

pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// One simulated host with isolated temp directories.
///
/// `home` stands in for HOME; `dir` holds the host's checkout of the
/// shared store. Child processes get HOME and `.current_dir()` set
/// explicitly so tests can run in parallel.
pub struct Test {
    /// Working directory; `secrets/` under it is the default store
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
}

impl Test {
    /// Create an empty host.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    /// Create a host with its identity generated.
    pub fn host(label: &str) -> Self {
        let t = Self::new();
        let output = t.init_cmd(label);
        assert!(
            output.status.success(),
            "Failed to initialize host: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// This host's own store directory.
    pub fn store_dir(&self) -> PathBuf {
        self.dir.path().join("secrets")
    }

    /// Default config location under the fake HOME.
    pub fn config_path(&self) -> PathBuf {
        self.home.path().join(".config/kindle/kindle.toml")
    }

    /// Path under the fake HOME.
    pub fn home_path(&self, rel: &str) -> PathBuf {
        self.home.path().join(rel)
    }

    /// Write kindle.toml pointing at `store`, followed by `body`.
    pub fn write_config(&self, label: &str, store: &Path, body: &str) {
        let contents = format!(
            "[host]\nlabel = \"{}\"\n\n[store]\ndir = '{}'\n{}",
            label,
            store.display(),
            body
        );
        let path = self.config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// This host's public key, as printed by `kindle whoami`.
    pub fn public_key(&self) -> String {
        let output = self.whoami();
        assertions::assert_success(&output);
        assertions::stdout(&output)
            .split_whitespace()
            .last()
            .expect("whoami printed nothing")
            .to_string()
    }
}

/// Write a policy sealing every bundle in `store` for `keys`.
pub fn write_policy(store: &Path, keys: &[&str]) {
    let list = keys
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");
    fs::create_dir_all(store).unwrap();
    fs::write(
        store.join("policy.toml"),
        format!("[[rules]]\npath = \".*\"\nrecipients = [{}]\n", list),
    )
    .unwrap();
}
