//! Cryptographic operations.
//!
//! Bundles treat the cipher as a black box: encrypt a string for a set of
//! recipients, decrypt it with one identity, fail hard for anyone else.
//! [`Age`] (x25519 with ASCII armor) is the only implementation.

use crate::error::Result;
use ::age::x25519;

mod age;

pub use age::{parse_recipient, Age};

/// Encrypt for many recipients, decrypt with one identity.
pub trait Cipher {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Encrypt plaintext for multiple recipients.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if encryption fails.
    fn encrypt(&self, plaintext: &str, recipients: &[Self::Recipient]) -> Result<String>;

    /// Decrypt an encrypted string using a private identity.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if the identity is not a
    /// recipient or the ciphertext is damaged. Never returns partial data.
    fn decrypt(&self, encrypted: &str, identity: &Self::Identity) -> Result<String>;
}

/// Encrypt plaintext for multiple age recipients.
///
/// Convenience wrapper around `Age::encrypt`.
pub fn encrypt(plaintext: &str, recipients: &[x25519::Recipient]) -> Result<String> {
    Age.encrypt(plaintext, recipients)
}

/// Decrypt an age-encrypted string using a private identity.
///
/// Convenience wrapper around `Age::decrypt`.
pub fn decrypt(encrypted: &str, identity: &x25519::Identity) -> Result<String> {
    Age.decrypt(encrypted, identity)
}
