//! Secret bundles.
//!
//! A bundle groups the secrets of one domain ("ai", "database") into a
//! single JSON document. Every field is its own age payload; the `meta`
//! block records the recipients the bundle was sealed for and a digest
//! that catches hand edits and truncation.
//!
//! Bundles are values: changing one produces a new bundle that is written
//! back as a whole file.

mod store;

pub use store::{BundleStore, ResealOutcome};

use std::collections::BTreeMap;

use age::x25519;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::cipher;
use crate::core::domain::Identity;
use crate::core::types::{BundleId, EncryptedValue, FieldName, PublicKey};
use crate::core::validation;
use crate::error::{BundleError, Result, SecretError};

/// Metadata block of a bundle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMeta {
    /// kindle version that sealed the bundle
    pub version: String,
    /// Public keys the fields were encrypted for, sorted
    pub recipients: Vec<PublicKey>,
    /// RFC 3339 timestamp of the last seal
    pub sealed_at: String,
    /// SHA-256 over recipients and field ciphertexts
    pub digest: String,
}

#[derive(Serialize, Deserialize)]
struct BundleFile {
    fields: BTreeMap<FieldName, EncryptedValue>,
    meta: BundleMeta,
}

/// An encrypted bundle of named secret fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBundle {
    id: BundleId,
    fields: BTreeMap<FieldName, EncryptedValue>,
    meta: BundleMeta,
}

impl SecretBundle {
    /// Seal a complete bundle from plaintext fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for invalid field names or empty values,
    /// or `CipherError` if encryption fails.
    pub fn seal<I, K, V>(id: &str, values: I, recipients: &[x25519::Recipient]) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        validation::validate_file_name(id)?;
        debug!(bundle = id, recipients = recipients.len(), "sealing bundle");

        let mut fields = BTreeMap::new();
        for (name, value) in values {
            let (name, value) = (name.as_ref(), value.as_ref());
            validation::validate_key(name)?;
            validation::validate_value(name, value)?;
            fields.insert(name.to_string(), cipher::encrypt(value, recipients)?);
        }

        Ok(Self::assemble(id, fields, recipient_keys(recipients)))
    }

    /// A copy of this bundle with `field` set to `value`, encrypted for the
    /// bundle's current recipients.
    ///
    /// Callers check the policy first; this never changes the recipient set.
    pub fn with_field(&self, field: &str, value: &str) -> Result<Self> {
        validation::validate_key(field)?;
        validation::validate_value(field, value)?;

        let recipients = self
            .meta
            .recipients
            .iter()
            .map(|k| cipher::parse_recipient(k))
            .collect::<Result<Vec<_>>>()?;

        let mut fields = self.fields.clone();
        fields.insert(field.to_string(), cipher::encrypt(value, &recipients)?);

        Ok(Self::assemble(&self.id, fields, self.meta.recipients.clone()))
    }

    /// Decrypt every field and seal them again for `recipients`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Decryption` if `identity` cannot open a field;
    /// nothing is produced in that case.
    pub fn reseal(&self, identity: &Identity, recipients: &[x25519::Recipient]) -> Result<Self> {
        debug!(bundle = %self.id, recipients = recipients.len(), "re-sealing bundle");

        let plaintext = self.decrypt_all(identity)?;
        Self::seal(
            &self.id,
            plaintext.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            recipients,
        )
    }

    /// Decrypt a single field.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::MissingField` if the bundle has no such field,
    /// or `SecretError::Decryption` naming the bundle if the identity is not
    /// a recipient.
    pub fn decrypt_field(&self, field: &str, identity: &Identity) -> Result<Zeroizing<String>> {
        let encrypted = self
            .fields
            .get(field)
            .ok_or_else(|| SecretError::MissingField {
                bundle: self.id.clone(),
                field: field.to_string(),
            })?;

        trace!(bundle = %self.id, field, "decrypting field");

        cipher::decrypt(encrypted, identity.as_age())
            .map(Zeroizing::new)
            .map_err(|e| {
                SecretError::Decryption {
                    bundle: self.id.clone(),
                    field: field.to_string(),
                    reason: e.to_string(),
                }
                .into()
            })
    }

    /// Decrypt all fields, in field-name order.
    pub fn decrypt_all(&self, identity: &Identity) -> Result<Vec<(FieldName, Zeroizing<String>)>> {
        self.fields
            .keys()
            .map(|name| Ok((name.clone(), self.decrypt_field(name, identity)?)))
            .collect()
    }

    /// Parse a bundle document and verify its digest.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::Parse` for malformed JSON or
    /// `BundleError::Integrity` when the digest doesn't match.
    pub fn from_json(id: &str, contents: &str) -> Result<Self> {
        let file: BundleFile = serde_json::from_str(contents).map_err(|source| {
            BundleError::Parse {
                bundle: id.to_string(),
                source,
            }
        })?;

        let expected = digest(&file.meta.recipients, &file.fields);
        if expected != file.meta.digest {
            return Err(BundleError::Integrity(id.to_string()).into());
        }

        Ok(Self {
            id: id.to_string(),
            fields: file.fields,
            meta: file.meta,
        })
    }

    /// Serialize the bundle document.
    pub fn to_json(&self) -> Result<String> {
        let file = BundleFile {
            fields: self.fields.clone(),
            meta: self.meta.clone(),
        };
        let mut json = serde_json::to_string_pretty(&file).map_err(|source| {
            BundleError::Serialize {
                bundle: self.id.clone(),
                source,
            }
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Bundle id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Keys the bundle was sealed for
    pub fn recipients_used(&self) -> &[PublicKey] {
        &self.meta.recipients
    }

    /// Field names, sorted
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Whether the bundle has `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    fn assemble(
        id: &str,
        fields: BTreeMap<FieldName, EncryptedValue>,
        recipients: Vec<PublicKey>,
    ) -> Self {
        let digest = digest(&recipients, &fields);
        Self {
            id: id.to_string(),
            fields,
            meta: BundleMeta {
                version: env!("CARGO_PKG_VERSION").to_string(),
                recipients,
                sealed_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                digest,
            },
        }
    }
}

fn recipient_keys(recipients: &[x25519::Recipient]) -> Vec<PublicKey> {
    let mut keys: Vec<PublicKey> = recipients.iter().map(|r| r.to_string()).collect();
    keys.sort();
    keys.dedup();
    keys
}

fn digest(recipients: &[PublicKey], fields: &BTreeMap<FieldName, EncryptedValue>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"kindle-bundle-v1\n");
    for key in recipients {
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
    }
    for (name, value) in fields {
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
