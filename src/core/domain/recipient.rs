//! Recipient representation.
//!
//! A validated public key, optionally named by the host that owns it.

use std::collections::BTreeMap;

use crate::core::cipher;
use crate::core::types::{HostLabel, PublicKey};
use crate::error::{PolicyError, Result};

/// A public key authorized to decrypt a bundle.
#[derive(Debug, Clone)]
pub struct Recipient {
    label: Option<HostLabel>,
    public_key: PublicKey,
}

impl Recipient {
    /// Create a new recipient, validating the public key.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidPublicKey` if the key format is invalid.
    pub fn new(label: Option<HostLabel>, public_key: PublicKey) -> Result<Self> {
        cipher::parse_recipient(&public_key)?;
        Ok(Self {
            label,
            public_key: public_key.trim().to_string(),
        })
    }

    /// Resolve a policy entry: either a raw `age1...` key or a host label.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownHost` for a label missing from `hosts`.
    pub fn resolve(entry: &str, hosts: &BTreeMap<HostLabel, PublicKey>) -> Result<Self> {
        let entry = entry.trim();
        if entry.starts_with("age1") {
            let label = hosts
                .iter()
                .find(|(_, key)| key.trim() == entry)
                .map(|(label, _)| label.clone());
            return Self::new(label, entry.to_string());
        }

        let key = hosts
            .get(entry)
            .ok_or_else(|| PolicyError::UnknownHost(entry.to_string()))?;
        Self::new(Some(entry.to_string()), key.clone())
    }

    /// Host label, when the key is known by one.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The recipient's public key.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", label, self.public_key),
            None => write!(f, "{}", self.public_key),
        }
    }
}
