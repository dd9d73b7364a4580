//! Atomic file replacement.
//!
//! Every file kindle generates is written to a temp file in the target's
//! directory and renamed over the target, so a concurrent reader observes
//! either the old or the new content, never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::trace;

/// Symlink hops followed before giving up on a chain.
const MAX_LINK_DEPTH: usize = 40;

/// Replace `path` with `contents` and set `mode` before the rename.
///
/// Parent directories are created as needed. The temp file lives next to
/// the target so the rename never crosses a filesystem boundary.
pub fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let parent = parent_dir(path);
    fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    set_mode(tmp.path(), mode)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    trace!(path = %path.display(), bytes = contents.len(), "replaced atomically");
    Ok(())
}

/// Like [`write_atomic`], but leaves the file untouched when it already has
/// exactly `contents`.
///
/// Returns `true` if the file was written.
pub fn write_if_changed(path: &Path, contents: &[u8], mode: u32) -> io::Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == contents => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    write_atomic(path, contents, mode)?;
    Ok(true)
}

/// Follow a symlinked file to the path that should actually be rewritten.
///
/// Renaming over a symlink would replace the link itself; dotfiles are
/// frequently symlinks into a repository, so writes go through to the
/// link's target instead. Dangling links resolve to where they point, so
/// the file is created there and the link stays in place.
pub fn resolve_write_target(path: &Path) -> PathBuf {
    let mut current = path.to_path_buf();

    for _ in 0..MAX_LINK_DEPTH {
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {}
            _ => break,
        }
        let Ok(dest) = fs::read_link(&current) else {
            break;
        };
        current = match current.parent() {
            Some(parent) if dest.is_relative() => parent.join(dest),
            _ => dest,
        };
    }

    trace!(path = %path.display(), target = %current.display(), "write target resolved");
    current
}

/// Permission bits of an existing file, or `default` when absent.
pub fn existing_mode(path: &Path, default: u32) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o777)
            .unwrap_or(default)
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        default
    }
}

/// Create a missing directory (and parents) restricted to `mode`.
///
/// An existing directory keeps its permissions.
pub fn create_private_dir(path: &Path, mode: u32) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    set_mode(path, mode)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
