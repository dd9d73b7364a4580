//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A bundle identifier (e.g., `ai`, `database`). Maps to `<store>/<id>.json`.
pub type BundleId = String;

/// A field name inside a bundle (e.g., OPENAI_API_KEY).
///
/// Must be a valid environment variable name.
pub type FieldName = String;

/// An encrypted field value (age-armored ciphertext).
pub type EncryptedValue = String;

/// An age public key string (starts with "age1...").
pub type PublicKey = String;

/// A host label, used as an alias for a host's public key in the policy.
pub type HostLabel = String;
