//! Secret binding.
//!
//! A host-local declaration that exposes one bundle field at a runtime path.

use std::path::{Path, PathBuf};

use crate::core::types::{BundleId, FieldName};

/// Expose `bundle_id`'s `field_name` at `runtime_path` as `env_name`.
///
/// Bindings are computed fresh from the host config on every activation
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBinding {
    logical_name: String,
    bundle_id: BundleId,
    field_name: FieldName,
    runtime_path: PathBuf,
    env_name: String,
}

impl SecretBinding {
    /// Create a binding. Inputs are validated by the config loader.
    pub fn new(
        logical_name: impl Into<String>,
        bundle_id: impl Into<BundleId>,
        field_name: impl Into<FieldName>,
        runtime_path: impl Into<PathBuf>,
        env_name: impl Into<String>,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            bundle_id: bundle_id.into(),
            field_name: field_name.into(),
            runtime_path: runtime_path.into(),
            env_name: env_name.into(),
        }
    }

    /// Logical name; also the default runtime file name.
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Bundle holding the field.
    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    /// Field inside the bundle.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Where the plaintext is materialized.
    pub fn runtime_path(&self) -> &Path {
        &self.runtime_path
    }

    /// Environment variable the shell snippets export.
    pub fn env_name(&self) -> &str {
        &self.env_name
    }
}

impl std::fmt::Display for SecretBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.logical_name, self.bundle_id, self.field_name)
    }
}
