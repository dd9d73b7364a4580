//! Input validation.
//!
//! Validates field names, binding names, bundle ids, and file permissions.

use crate::error::{Result, ValidationError};

/// Validate an environment variable name.
///
/// Field names and exported variable names must be valid environment
/// variable names:
/// - Only A-Z, a-z, 0-9, and underscore
/// - Cannot start with a digit
/// - Cannot be empty
///
/// # Errors
///
/// Returns `ValidationError` if the name is invalid.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey.into());
    }

    if let Some(first_char) = key.chars().next() {
        if first_char.is_ascii_digit() {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: "cannot start with a digit".to_string(),
            }
            .into());
        }
    }

    for (i, ch) in key.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: format!(
                    "invalid character '{}' at position {}. Only letters, digits, and underscore are allowed",
                    ch,
                    i + 1
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Validate a name that becomes a single path component.
///
/// Used for binding names (runtime file names) and bundle ids. Allows
/// letters, digits, `_`, `-`, and `.`, but no leading dot.
///
/// # Errors
///
/// Returns `ValidationError` if the name could escape its directory or
/// produce a hidden file.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyKey.into());
    }

    if name.starts_with('.') {
        return Err(ValidationError::InvalidKey {
            key: name.to_string(),
            reason: "cannot start with '.'".to_string(),
        }
        .into());
    }

    if let Some(ch) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::InvalidKey {
            key: name.to_string(),
            reason: format!("invalid character '{}'", ch),
        }
        .into());
    }

    Ok(())
}

/// Validate a secret value.
///
/// Secret values cannot be empty, including after trimming: a
/// whitespace-only value would materialize as an empty file.
///
/// # Errors
///
/// Returns `ValidationError` if the value is empty.
pub fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyValue(key.to_string()).into());
    }

    Ok(())
}

/// Validate file permissions (Unix only).
///
/// Checks that a file has the expected permissions mode.
///
/// # Errors
///
/// Returns `ValidationError` if permissions don't match.
#[cfg(unix)]
pub fn validate_file_permissions(path: &std::path::Path, expected_mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let actual_mode = metadata.permissions().mode() & 0o777;

    if actual_mode != expected_mode {
        return Err(ValidationError::InvalidPermissions {
            path: path.display().to_string(),
            expected: format!("{:o}", expected_mode),
            actual: format!("{:o}", actual_mode),
        }
        .into());
    }

    Ok(())
}
