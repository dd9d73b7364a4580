//! Managed reference block in a user-owned entrypoint.
//!
//! The entrypoint belongs to the user. kindle owns exactly the lines between
//! its begin and end markers and never touches anything else. If the user
//! has written the bare reference line themselves, no block is added.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use super::ShellDialect;
use crate::core::atomic;
use crate::core::constants::{BLOCK_BEGIN, BLOCK_END};

/// What [`ensure_reference`] did to an entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrypointChange {
    /// File did not exist; a stub holding only the block was written
    Created,
    /// Block appended to existing content
    Appended,
    /// Existing block rewritten to the expected reference
    Repaired,
    /// Reference already present
    Unchanged,
}

impl EntrypointChange {
    /// Whether the file on disk was modified
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Make sure `path` sources the snippet through `reference` exactly once.
///
/// Symlinked entrypoints are edited through the link. The file's existing
/// permission bits are kept.
pub fn ensure_reference(
    path: &Path,
    dialect: ShellDialect,
    reference: &str,
) -> io::Result<EntrypointChange> {
    let target = atomic::resolve_write_target(path);

    let existing = match fs::read_to_string(&target) {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let (updated, change) = match existing {
        None => (
            format!("# {} configuration\n\n{}", dialect.name(), block(reference)),
            EntrypointChange::Created,
        ),
        Some(contents) => match apply(&contents, reference) {
            Some((updated, change)) => (updated, change),
            None => return Ok(EntrypointChange::Unchanged),
        },
    };

    let mode = atomic::existing_mode(&target, 0o644);
    atomic::write_if_changed(&target, updated.as_bytes(), mode)?;
    debug!(path = %target.display(), ?change, "entrypoint updated");
    Ok(change)
}

fn begin_marker() -> String {
    format!("# {}", BLOCK_BEGIN)
}

fn end_marker() -> String {
    format!("# {}", BLOCK_END)
}

fn block(reference: &str) -> String {
    format!("{}\n{}\n{}\n", begin_marker(), reference, end_marker())
}

/// Compute the new content, or `None` when nothing has to change.
fn apply(contents: &str, reference: &str) -> Option<(String, EntrypointChange)> {
    let lines: Vec<&str> = contents.split_inclusive('\n').collect();
    let begin = begin_marker();
    let end = end_marker();

    let begin_at = lines.iter().position(|l| l.trim() == begin);

    if let Some(start) = begin_at {
        let end_at = lines[start + 1..]
            .iter()
            .position(|l| l.trim() == end)
            .map(|i| start + 1 + i);

        let mut out = String::with_capacity(contents.len() + reference.len());
        for line in &lines[..=start] {
            out.push_str(line);
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(reference);
        out.push('\n');

        match end_at {
            Some(stop) => {
                let inner: Vec<&str> = lines[start + 1..stop].iter().map(|l| l.trim_end()).collect();
                if inner == [reference] {
                    return None;
                }
                for line in &lines[stop..] {
                    out.push_str(line);
                }
            }
            None => {
                // Unterminated block: close it without consuming user lines.
                out.push_str(&end);
                out.push('\n');
                for line in &lines[start + 1..] {
                    out.push_str(line);
                }
            }
        }
        return Some((out, EntrypointChange::Repaired));
    }

    if lines.iter().any(|l| l.trim() == reference) {
        return None;
    }

    let mut out = contents.to_string();
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&block(reference));
    Some((out, EntrypointChange::Appended))
}
