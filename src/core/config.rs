//! Host configuration.
//!
//! Handles reading, writing, and validating `kindle.toml`, the declared
//! state every activation recomputes from.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::domain::SecretBinding;
use crate::core::shell::ShellDialect;
use crate::core::{atomic, validation};
use crate::error::{ConfigError, Result};

/// Host configuration stored in `kindle.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// This host's identity
    #[serde(default)]
    pub host: HostSection,
    /// Where sealed bundles and the recipient policy live
    #[serde(default)]
    pub store: StoreSection,
    /// Where secrets are materialized
    #[serde(default)]
    pub runtime: RuntimeSection,
    /// Declared secret bindings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<BindingConfig>,
    /// Shell integration
    #[serde(default)]
    pub shell: ShellSection,
    /// Managed symlinks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkConfig>,
    /// Tools installed when missing from PATH
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,
    /// File this config was loaded from; relative paths resolve against its directory
    #[serde(skip)]
    path: PathBuf,
}

/// `[host]` section
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct HostSection {
    /// Host label (default: hostname)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Private key file (default: ~/.config/kindle/identity.key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

/// `[store]` section
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// Bundle directory (default: `secrets/` next to the config file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Policy file (default: `<dir>/policy.toml`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

/// `[runtime]` section
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RuntimeSection {
    /// Materialized secret directory (default: ~/.secrets)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// One `[[secrets]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Logical name; default runtime file name
    pub name: String,
    /// Bundle id
    pub bundle: String,
    /// Field inside the bundle
    pub field: String,
    /// Explicit runtime path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Exported variable name (default: the field name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

/// `[shell]` section
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ShellSection {
    /// Dialects to integrate
    #[serde(default)]
    pub dialects: Vec<ShellDialect>,
    /// Snippet directory (default: ~/.local/state/kindle/shell)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<String>,
    /// Tool init hooks (e.g. zoxide)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<HookConfig>,
}

/// One `[[shell.hooks]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Executable name
    pub tool: String,
    /// Arguments producing the init script; `{shell}` becomes the dialect name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

/// One `[[links]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub source: String,
    pub target: String,
}

/// One `[[tools]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Executable looked up on PATH
    pub name: String,
    /// Command run when the executable is missing
    pub install: Vec<String>,
}

impl HookConfig {
    /// Arguments for `dialect`, with the placeholder substituted.
    pub fn args_for(&self, dialect: ShellDialect) -> Vec<String> {
        let defaults = ["init".to_string(), constants::SHELL_PLACEHOLDER.to_string()];
        self.args
            .as_deref()
            .unwrap_or(&defaults)
            .iter()
            .map(|a| a.replace(constants::SHELL_PLACEHOLDER, dialect.name()))
            .collect()
    }
}

impl Config {
    /// Default config location (`~/.config/kindle/kindle.toml`)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoHomeDir` if HOME cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        Ok(home()?
            .join(constants::CONFIG_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Create an empty configuration bound to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Load and validate configuration from `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist,
    /// `ConfigError::Parse` if the TOML is malformed, or a validation error.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.path = path.to_path_buf();

        debug!(
            secrets = config.secrets.len(),
            dialects = config.shell.dialects.len(),
            links = config.links.len(),
            tools = config.tools.len(),
            "config loaded"
        );

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to its path atomically
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self) -> Result<()> {
        debug!(path = %self.path.display(), "saving config");

        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let mode = atomic::existing_mode(&self.path, 0o644);
        atomic::write_atomic(&self.path, contents.as_bytes(), mode)?;

        Ok(())
    }

    /// File this config belongs to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Host label, falling back to the machine's hostname
    pub fn host_label(&self) -> String {
        self.host
            .label
            .clone()
            .or_else(|| whoami::fallible::hostname().ok())
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// Private key file
    pub fn identity_path(&self) -> Result<PathBuf> {
        match &self.host.identity {
            Some(raw) => self.resolve(raw),
            None => Ok(home()?
                .join(constants::CONFIG_DIR)
                .join(constants::IDENTITY_FILE)),
        }
    }

    /// Bundle store directory
    pub fn store_dir(&self) -> Result<PathBuf> {
        match &self.store.dir {
            Some(raw) => self.resolve(raw),
            None => Ok(self.base_dir().join("secrets")),
        }
    }

    /// Recipient policy file
    pub fn policy_path(&self) -> Result<PathBuf> {
        match &self.store.policy {
            Some(raw) => self.resolve(raw),
            None => Ok(self.store_dir()?.join(constants::POLICY_FILE)),
        }
    }

    /// Materialized secret directory
    pub fn runtime_dir(&self) -> Result<PathBuf> {
        match &self.runtime.dir {
            Some(raw) => self.resolve(raw),
            None => Ok(home()?.join(constants::RUNTIME_DIR)),
        }
    }

    /// Generated shell snippet directory
    pub fn shell_state_dir(&self) -> Result<PathBuf> {
        match &self.shell.state_dir {
            Some(raw) => self.resolve(raw),
            None => Ok(home()?.join(constants::SHELL_STATE_DIR)),
        }
    }

    /// Secret bindings with every path resolved
    ///
    /// # Errors
    ///
    /// Returns error if HOME cannot be determined for a `~` path.
    pub fn bindings(&self) -> Result<Vec<SecretBinding>> {
        let runtime_dir = self.runtime_dir()?;
        self.secrets
            .iter()
            .map(|b| {
                let path = match &b.path {
                    Some(raw) => self.resolve(raw)?,
                    None => runtime_dir.join(&b.name),
                };
                let env = b.env.clone().unwrap_or_else(|| b.field.clone());
                Ok(SecretBinding::new(&b.name, &b.bundle, &b.field, path, env))
            })
            .collect()
    }

    /// Expand `~` and resolve relative paths against the config's directory
    pub fn resolve(&self, raw: &str) -> Result<PathBuf> {
        expand_path(raw, &self.base_dir())
    }

    /// Validate the configuration structure and contents
    ///
    /// Checks:
    /// - Binding names and bundle ids are safe file names
    /// - Field and env names are valid environment variable names
    /// - Binding names are unique
    /// - Dialects are not repeated
    /// - Tool install commands are non-empty
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` or `ValidationError` on validation failure.
    pub fn validate(&self) -> Result<()> {
        debug!("validating config");

        let mut names = BTreeSet::new();
        for binding in &self.secrets {
            validation::validate_file_name(&binding.name)?;
            validation::validate_file_name(&binding.bundle)?;
            validation::validate_key(&binding.field)?;
            if let Some(env) = &binding.env {
                validation::validate_key(env)?;
            }
            if !names.insert(binding.name.as_str()) {
                return Err(ConfigError::DuplicateBinding(binding.name.clone()).into());
            }
        }

        let mut dialects = BTreeSet::new();
        for dialect in &self.shell.dialects {
            if !dialects.insert(dialect.name()) {
                return Err(ConfigError::InvalidValue {
                    field: "shell.dialects",
                    reason: format!("'{}' listed twice", dialect.name()),
                }
                .into());
            }
        }

        for hook in &self.shell.hooks {
            if hook.tool.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "shell.hooks",
                    reason: "hook tool cannot be empty".to_string(),
                }
                .into());
            }
        }

        for tool in &self.tools {
            if tool.install.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "tools",
                    reason: format!("install command for '{}' is empty", tool.name),
                }
                .into());
            }
        }

        Ok(())
    }

    fn base_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Expand a leading `~` to HOME; join relative paths onto `base`.
pub fn expand_path(raw: &str, base: &Path) -> Result<PathBuf> {
    let path = if raw == "~" {
        home()?
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base.join(path))
    }
}

fn home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| ConfigError::NoHomeDir.into())
}
