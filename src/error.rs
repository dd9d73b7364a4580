//! Error types.
//!
//! Each concern has its own enum; [`Error`] unifies them so `?` works across
//! module boundaries.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::activation::Stage;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config not found: {} (create it or pass --config)", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("duplicate secret binding: {0}")]
    DuplicateBinding(String),

    #[error("unable to determine home directory")]
    NoHomeDir,
}

/// Identity store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no private key found at {0}")]
    NoPrivateKey(String),

    #[error("identity already exists at {0} (use --force to replace)")]
    AlreadyExists(String),

    #[error("invalid identity format: {0}")]
    InvalidFormat(String),

    #[error("failed to read identity: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("failed to write identity: {0}")]
    WriteFailed(#[source] std::io::Error),
}

/// Errors from the age primitive.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("armor encoding failed: {0}")]
    ArmorFailed(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Recipient policy errors.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("policy not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse policy {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown host label in policy: {0}")]
    UnknownHost(String),

    #[error("policy rule '{0}' lists no recipients")]
    EmptyRule(String),

    #[error("no policy rule matches bundle path {0}")]
    NoMatchingRule(String),

    #[error(
        "policy drift on bundle '{bundle}': {} added, {} removed (run `kindle reseal {bundle}`)",
        .added.len(),
        .removed.len()
    )]
    Drift {
        bundle: String,
        added: Vec<String>,
        removed: Vec<String>,
    },
}

/// Bundle file errors.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("failed to parse bundle '{bundle}': {source}")]
    Parse {
        bundle: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize bundle '{bundle}': {source}")]
    Serialize {
        bundle: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("bundle '{0}' failed its integrity check (edited or truncated)")]
    Integrity(String),

    #[error("invalid bundle id: {0}")]
    InvalidId(String),
}

/// Secret materialization errors.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("cannot decrypt field '{field}' of bundle '{bundle}': {reason}")]
    Decryption {
        bundle: String,
        field: String,
        reason: String,
    },

    #[error("bundle '{bundle}' not found at {}", .path.display())]
    MissingBundle { bundle: String, path: PathBuf },

    #[error("bundle '{bundle}' has no field '{field}'")]
    MissingField { bundle: String, field: String },

    #[error("cannot write {} with mode 0600: {source}", .path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Shell integration errors. Downgraded to warnings during activation.
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("cannot write {dialect} integration {}: {source}", .path.display())]
    Write {
        dialect: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hook '{tool}' for {dialect}: {reason}")]
    Hook {
        dialect: &'static str,
        tool: String,
        reason: String,
    },
}

/// Symlink management errors.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("{} exists and is not a symlink; refusing to replace it", .target.display())]
    Conflict { target: PathBuf },

    #[error("link source does not exist: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("failed to link {}: {source}", .target.display())]
    Io {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fallback tool installation errors.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start installer for '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("installer for '{tool}' exited with {status}")]
    InstallFailed { tool: String, status: String },
}

/// Input validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyKey,

    #[error("invalid name '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value for '{0}' cannot be empty")]
    EmptyValue(String),

    #[error("{path} has mode {actual}, expected {expected}")]
    InvalidPermissions {
        path: String,
        expected: String,
        actual: String,
    },
}

/// A fatal failure inside one activation stage.
#[derive(Error, Debug)]
#[error("[{stage}] {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: Box<Error>,
}

impl StageError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self {
            stage,
            source: Box::new(source),
        }
    }

    /// The originating error, unwrapped from the stage.
    pub fn inner(&self) -> &Error {
        &self.source
    }
}

impl Error {
    /// Whether this error must abort an activation run.
    ///
    /// Only shell integration and policy drift degrade to warnings.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Integration(_) => false,
            Error::Policy(PolicyError::Drift { .. }) => false,
            Error::Stage(e) => e.inner().is_fatal(),
            _ => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
