//! Managed symlinks.
//!
//! A link is only ever created or replaced when the target is absent or is
//! already a symlink. Regular files and directories at a target are user
//! data and produce a conflict instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{LinkError, Result};

/// What [`ensure_link`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    /// A symlink pointing elsewhere was swapped
    Replaced,
    Unchanged,
}

/// A declared symlink with resolved paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl Link {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Point `target` at `source`.
    ///
    /// # Errors
    ///
    /// - `LinkError::MissingSource` if `source` does not exist
    /// - `LinkError::Conflict` if `target` exists and is not a symlink
    /// - `LinkError::Io` if the link cannot be created
    pub fn ensure(&self) -> Result<LinkOutcome> {
        ensure_link(&self.source, &self.target)
    }
}

/// Point `target` at `source`, replacing a stale symlink atomically.
pub fn ensure_link(source: &Path, target: &Path) -> Result<LinkOutcome> {
    if fs::symlink_metadata(source).is_err() {
        return Err(LinkError::MissingSource(source.to_path_buf()).into());
    }

    let io_err = |source| LinkError::Io {
        target: target.to_path_buf(),
        source,
    };

    let outcome = match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let current = fs::read_link(target).map_err(io_err)?;
            if current == source {
                debug!(target = %target.display(), "link already correct");
                return Ok(LinkOutcome::Unchanged);
            }
            LinkOutcome::Replaced
        }
        Ok(_) => {
            return Err(LinkError::Conflict {
                target: target.to_path_buf(),
            }
            .into())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => LinkOutcome::Created,
        Err(e) => return Err(io_err(e).into()),
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    replace_symlink(source, target).map_err(io_err)?;

    info!(
        source = %source.display(),
        target = %target.display(),
        ?outcome,
        "link updated"
    );
    Ok(outcome)
}

/// Create the link under a temporary name, then rename it over `target`.
#[cfg(unix)]
fn replace_symlink(source: &Path, target: &Path) -> io::Result<()> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = target.with_file_name(format!(".{}.kindle-{}", name, std::process::id()));

    let _ = fs::remove_file(&tmp);
    std::os::unix::fs::symlink(source, &tmp)?;
    fs::rename(&tmp, target).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        e
    })
}

#[cfg(not(unix))]
fn replace_symlink(_source: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are only managed on unix",
    ))
}
