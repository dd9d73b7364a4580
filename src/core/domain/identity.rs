//! Host identity.
//!
//! Wraps the host's age private key. The key file path is local state only;
//! versioned files (policy, bundles) carry the public half.

use std::fs;
use std::path::{Path, PathBuf};

use age::x25519;
use tracing::{debug, warn};

use crate::core::constants::SECRET_MODE;
use crate::core::types::{HostLabel, PublicKey};
use crate::core::{atomic, validation};
use crate::error::{Result, StoreError};

/// A host's private key identity, the root of trust for decryption.
pub struct Identity {
    host_label: HostLabel,
    inner: x25519::Identity,
    path: PathBuf,
}

impl Identity {
    /// Load the identity stored at `path`.
    ///
    /// Looser-than-0600 permissions are logged as a warning but not refused.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoPrivateKey` if the file doesn't exist, or
    /// `StoreError::InvalidFormat` if it doesn't hold an age secret key.
    pub fn load(path: &Path, host_label: &str) -> Result<Self> {
        debug!(path = %path.display(), host = host_label, "loading identity");

        if !path.exists() {
            return Err(StoreError::NoPrivateKey(path.display().to_string()).into());
        }

        #[cfg(unix)]
        {
            if validation::validate_file_permissions(path, SECRET_MODE).is_err() {
                let mode = fs::metadata(path)
                    .map(|m| {
                        use std::os::unix::fs::PermissionsExt;
                        format!("{:o}", m.permissions().mode() & 0o777)
                    })
                    .unwrap_or_else(|_| "unknown".to_string());

                warn!(
                    path = %path.display(),
                    mode = %mode,
                    "insecure identity file permissions"
                );
            }
        }

        let contents = fs::read_to_string(path).map_err(StoreError::ReadFailed)?;

        // age-keygen output carries comment lines; take the key line.
        let key_line = contents
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .ok_or_else(|| StoreError::InvalidFormat("empty identity file".to_string()))?;

        let inner: x25519::Identity = key_line
            .parse()
            .map_err(|e: &str| StoreError::InvalidFormat(e.to_string()))?;

        debug!("identity loaded");

        Ok(Self {
            host_label: host_label.to_string(),
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Generate a new identity and save it to `path` with mode 0600.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if a key is present and `force`
    /// is false. Replacing a key revokes this host's access to every bundle
    /// sealed for the old one.
    pub fn generate(path: &Path, host_label: &str, force: bool) -> Result<Self> {
        debug!(path = %path.display(), host = host_label, "generating identity");

        if path.exists() && !force {
            return Err(StoreError::AlreadyExists(path.display().to_string()).into());
        }

        let inner = x25519::Identity::generate();

        use age::secrecy::ExposeSecret;
        let secret = inner.to_string();
        let contents = format!(
            "# host: {}\n# public key: {}\n{}\n",
            host_label,
            inner.to_public(),
            secret.expose_secret()
        );

        atomic::write_atomic(path, contents.as_bytes(), SECRET_MODE)
            .map_err(StoreError::WriteFailed)?;

        debug!(path = %path.display(), "identity saved");

        Ok(Self {
            host_label: host_label.to_string(),
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Wrap an in-memory age identity. Not persisted.
    pub fn from_age(host_label: &str, inner: x25519::Identity) -> Self {
        Self {
            host_label: host_label.to_string(),
            inner,
            path: PathBuf::new(),
        }
    }

    /// Label of the host this identity belongs to
    pub fn host_label(&self) -> &str {
        &self.host_label
    }

    /// Corresponding public key
    pub fn public_key(&self) -> PublicKey {
        self.inner.to_public().to_string()
    }

    /// Reference to the inner age identity for decryption
    pub fn as_age(&self) -> &x25519::Identity {
        &self.inner
    }

    /// Key file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("host_label", &self.host_label)
            .field("path", &self.path)
            .field("public_key", &self.public_key())
            .finish()
    }
}
