//! Constants used throughout kindle.
//!
//! Centralizes file names, default locations, and marker strings.

/// Host configuration file name.
pub const CONFIG_FILE: &str = "kindle.toml";

/// Default config directory relative to HOME (~/.config/kindle).
pub const CONFIG_DIR: &str = ".config/kindle";

/// Default identity file name inside the config directory.
pub const IDENTITY_FILE: &str = "identity.key";

/// Recipient policy file name inside the bundle store.
pub const POLICY_FILE: &str = "policy.toml";

/// File extension for sealed bundles.
pub const BUNDLE_EXT: &str = "json";

/// Default runtime directory for materialized secrets, relative to HOME.
pub const RUNTIME_DIR: &str = ".secrets";

/// Default directory for generated shell snippets, relative to HOME.
pub const SHELL_STATE_DIR: &str = ".local/state/kindle/shell";

/// Permission bits for materialized secrets and identity files.
pub const SECRET_MODE: u32 = 0o600;

/// Permission bits for directories holding secrets.
pub const SECRET_DIR_MODE: u32 = 0o700;

/// Opening marker of the managed block in a shell entrypoint.
pub const BLOCK_BEGIN: &str = ">>> kindle >>>";

/// Closing marker of the managed block in a shell entrypoint.
pub const BLOCK_END: &str = "<<< kindle <<<";

/// Placeholder substituted with the dialect name in hook arguments.
pub const SHELL_PLACEHOLDER: &str = "{shell}";
