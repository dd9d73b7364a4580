//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a kindle command with an isolated environment.
    ///
    /// Returns a Command configured with:
    /// - HOME set to the temporary home directory
    /// - Current directory set to the test working directory
    /// - Colors and inherited kindle variables cleared
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("kindle").expect("failed to find kindle binary");
        cmd.env("HOME", self.home.path());
        // Windows uses USERPROFILE instead of HOME for home directory
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("KINDLE_CONFIG");
        cmd.env_remove("KINDLE_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `kindle init --label`.
    pub fn init_cmd(&self, label: &str) -> Output {
        self.cmd()
            .args(["init", "--label", label])
            .output()
            .expect("failed to run kindle init")
    }

    /// Shortcut for `kindle whoami`.
    pub fn whoami(&self) -> Output {
        self.cmd()
            .arg("whoami")
            .output()
            .expect("failed to run kindle whoami")
    }

    /// Shortcut for `kindle seal <bundle> <field> <value>`.
    pub fn seal(&self, bundle: &str, field: &str, value: &str) -> Output {
        self.cmd()
            .args(["seal", bundle, field, value])
            .output()
            .expect("failed to run kindle seal")
    }

    /// Shortcut for `kindle activate`.
    pub fn activate(&self) -> Output {
        self.cmd()
            .arg("activate")
            .output()
            .expect("failed to run kindle activate")
    }

    /// Shortcut for `kindle reseal`.
    pub fn reseal(&self) -> Output {
        self.cmd()
            .arg("reseal")
            .output()
            .expect("failed to run kindle reseal")
    }

    /// Shortcut for `kindle reseal --dry-run`.
    pub fn reseal_dry_run(&self) -> Output {
        self.cmd()
            .args(["reseal", "--dry-run"])
            .output()
            .expect("failed to run kindle reseal --dry-run")
    }
}
