//! Test fixtures and constants.

/// A valid age public key for a host that never runs in tests.
pub const OFFLINE_HOST_KEY: &str = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

/// An invalid public key for negative tests.
pub const INVALID_PUBLIC_KEY: &str = "not-a-valid-age-key";

/// The OpenAI key used by the activation scenarios.
pub const OPENAI_VALUE: &str = "sk-test-openai-0123456789";

/// One binding exposed to fish.
pub const OPENAI_FISH: &str = r#"
[[secrets]]
name = "openai_key"
bundle = "ai"
field = "OPENAI_API_KEY"

[shell]
dialects = ["fish"]
"#;

/// The same binding exposed to every dialect.
pub const OPENAI_ALL_SHELLS: &str = r#"
[[secrets]]
name = "openai_key"
bundle = "ai"
field = "OPENAI_API_KEY"

[shell]
dialects = ["fish", "nushell", "zsh", "bash"]
"#;

/// A user's existing fish config.
pub const USER_FISH_CONFIG: &str = "alias ll 'ls -la'\nalias g git\nset -gx EDITOR nvim\n";
