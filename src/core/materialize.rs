//! Secret materialization.
//!
//! Decrypts bound bundle fields with the host identity and writes each one
//! to its runtime path as a 0600 file. The whole binding set is decrypted
//! in memory before the first file is written, so a decryption failure
//! leaves every runtime file as it was.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::bundle::{BundleStore, SecretBundle};
use crate::core::constants::{SECRET_DIR_MODE, SECRET_MODE};
use crate::core::domain::{Identity, SecretBinding};
use crate::core::atomic;
use crate::error::{Result, SecretError};

/// A secret written to disk by this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedSecret {
    /// Binding it came from
    pub logical_name: String,
    /// File holding the plaintext
    pub runtime_path: PathBuf,
}

impl MaterializedSecret {
    /// Permission bits of every materialized file.
    pub const MODE: u32 = SECRET_MODE;
}

/// Decrypts bindings into runtime files.
pub struct Materializer<'a> {
    store: &'a BundleStore,
    identity: &'a Identity,
}

impl<'a> Materializer<'a> {
    pub fn new(store: &'a BundleStore, identity: &'a Identity) -> Self {
        Self { store, identity }
    }

    /// Materialize one binding and return its runtime path.
    ///
    /// # Errors
    ///
    /// - `SecretError::MissingBundle` if the bundle file is absent
    /// - `SecretError::MissingField` if the bundle lacks the field
    /// - `SecretError::Decryption` if this host is not a recipient
    /// - `SecretError::Permission` if the file cannot be written 0600
    pub fn materialize(&self, binding: &SecretBinding) -> Result<PathBuf> {
        let bundle = self.store.load(binding.bundle_id())?;
        let value = bundle.decrypt_field(binding.field_name(), self.identity)?;
        self.write(binding.runtime_path(), &value)?;
        Ok(binding.runtime_path().to_path_buf())
    }

    /// Materialize every binding, all or nothing for decryption.
    pub fn materialize_all(&self, bindings: &[SecretBinding]) -> Result<Vec<MaterializedSecret>> {
        let mut bundles: BTreeMap<&str, SecretBundle> = BTreeMap::new();
        let mut decrypted: Vec<(&SecretBinding, Zeroizing<String>)> =
            Vec::with_capacity(bindings.len());

        for binding in bindings {
            if !bundles.contains_key(binding.bundle_id()) {
                let bundle = self.store.load(binding.bundle_id())?;
                bundles.insert(binding.bundle_id(), bundle);
            }
            let bundle = &bundles[binding.bundle_id()];
            let value = bundle.decrypt_field(binding.field_name(), self.identity)?;
            decrypted.push((binding, value));
        }

        debug!(count = decrypted.len(), "all bindings decrypted");

        let mut written = Vec::with_capacity(decrypted.len());
        for (binding, value) in decrypted {
            self.write(binding.runtime_path(), &value)?;
            written.push(MaterializedSecret {
                logical_name: binding.logical_name().to_string(),
                runtime_path: binding.runtime_path().to_path_buf(),
            });
        }

        info!(count = written.len(), "secrets materialized");
        Ok(written)
    }

    /// Bundles referenced by `bindings`, deduplicated and sorted.
    pub fn bundles_referenced(bindings: &[SecretBinding]) -> Vec<&str> {
        let mut ids: Vec<&str> = bindings.iter().map(|b| b.bundle_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn write(&self, path: &Path, value: &str) -> Result<()> {
        let permission = |source| SecretError::Permission {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            atomic::create_private_dir(parent, SECRET_DIR_MODE).map_err(permission)?;
        }

        // Consumers read the file as a single token.
        let trimmed = value.trim_end();
        atomic::write_atomic(path, trimmed.as_bytes(), SECRET_MODE).map_err(permission)?;

        debug!(path = %path.display(), "secret written");
        Ok(())
    }
}
