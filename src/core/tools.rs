//! Fallback tool installation.

use std::path::PathBuf;
use std::process::Command;

use tracing::{info, warn};

use crate::error::{Result, ToolError};

/// What [`ensure_tool`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Already on PATH at this location
    Present(PathBuf),
    /// Install command ran successfully
    Installed,
}

/// Run `install` when `name` is not on PATH.
///
/// # Errors
///
/// - `ToolError::Spawn` if the installer cannot be started
/// - `ToolError::InstallFailed` if it exits unsuccessfully
pub fn ensure_tool(name: &str, install: &[String]) -> Result<ToolOutcome> {
    if let Ok(path) = which::which(name) {
        return Ok(ToolOutcome::Present(path));
    }

    let Some((program, args)) = install.split_first() else {
        return Err(ToolError::InstallFailed {
            tool: name.to_string(),
            status: "no install command".to_string(),
        }
        .into());
    };

    info!(tool = name, installer = %program, "installing missing tool");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| ToolError::Spawn {
            tool: name.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(ToolError::InstallFailed {
            tool: name.to_string(),
            status: status.to_string(),
        }
        .into());
    }

    if which::which(name).is_err() {
        warn!(tool = name, "installed but still not found on PATH");
    }
    Ok(ToolOutcome::Installed)
}
