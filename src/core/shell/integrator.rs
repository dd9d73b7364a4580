//! Per-dialect integration: snippet, hook cache, and entrypoint reference.

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info, warn};

use super::{ensure_reference, render, EntrypointChange, ShellDialect};
use crate::core::atomic;
use crate::core::config::HookConfig;
use crate::core::domain::SecretBinding;
use crate::error::{IntegrationError, Result};

/// Files produced for one dialect.
#[derive(Debug)]
pub struct ShellArtifact {
    pub dialect: ShellDialect,
    /// Generated snippet
    pub snippet_path: PathBuf,
    /// User entrypoint holding the reference
    pub entrypoint_path: PathBuf,
    /// Whether the snippet content changed this run
    pub snippet_written: bool,
    pub entrypoint: EntrypointChange,
    /// Hooks that were skipped
    pub warnings: Vec<IntegrationError>,
}

/// Writes shell integration under a state directory.
#[derive(Debug, Clone)]
pub struct ShellIntegrator {
    state_dir: PathBuf,
    home: PathBuf,
}

impl ShellIntegrator {
    /// `home` anchors the default entrypoint locations.
    pub fn new(state_dir: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            home: home.into(),
        }
    }

    /// Snippet file for `dialect`
    pub fn snippet_path(&self, dialect: ShellDialect) -> PathBuf {
        self.state_dir.join(dialect.snippet_file_name())
    }

    /// Pre-rendered hook output for dialects that cannot eval at startup
    pub fn hook_cache_path(&self, dialect: ShellDialect, tool: &str) -> PathBuf {
        self.state_dir
            .join("hooks")
            .join(format!("{}.{}", tool, dialect.extension()))
    }

    /// Write the snippet for `dialect` and reference it from the entrypoint.
    ///
    /// Hook failures are collected on the artifact and the hook is left out.
    ///
    /// # Errors
    ///
    /// Returns `IntegrationError::Write` if the snippet or entrypoint
    /// cannot be written.
    pub fn integrate(
        &self,
        dialect: ShellDialect,
        bindings: &[SecretBinding],
        hooks: &[HookConfig],
    ) -> Result<ShellArtifact> {
        let mut warnings = Vec::new();
        let mut hook_lines = Vec::with_capacity(hooks.len());

        for hook in hooks {
            match self.hook_lines(dialect, hook) {
                Ok(Some(lines)) => hook_lines.push(lines),
                Ok(None) => {}
                Err(e) => {
                    warn!(dialect = dialect.name(), tool = %hook.tool, error = %e, "hook skipped");
                    warnings.push(e);
                }
            }
        }

        let snippet_path = self.snippet_path(dialect);
        let snippet = render(dialect, bindings, &hook_lines);
        let snippet_written = atomic::write_if_changed(&snippet_path, snippet.as_bytes(), 0o644)
            .map_err(|source| IntegrationError::Write {
                dialect: dialect.name(),
                path: snippet_path.clone(),
                source,
            })?;

        let entrypoint_path = dialect.entrypoint_path(&self.home);
        let reference = dialect.reference_line(&snippet_path);
        let entrypoint = ensure_reference(&entrypoint_path, dialect, &reference).map_err(|source| {
            IntegrationError::Write {
                dialect: dialect.name(),
                path: entrypoint_path.clone(),
                source,
            }
        })?;

        info!(
            dialect = dialect.name(),
            snippet_written,
            entrypoint = ?entrypoint,
            "shell integrated"
        );

        Ok(ShellArtifact {
            dialect,
            snippet_path,
            entrypoint_path,
            snippet_written,
            entrypoint,
            warnings,
        })
    }

    fn hook_lines(
        &self,
        dialect: ShellDialect,
        hook: &HookConfig,
    ) -> std::result::Result<Option<String>, IntegrationError> {
        let args = hook.args_for(dialect);

        if dialect != ShellDialect::Nushell {
            return Ok(dialect.hook_lines(&hook.tool, &args, None));
        }

        let failed = |reason: String| IntegrationError::Hook {
            dialect: dialect.name(),
            tool: hook.tool.clone(),
            reason,
        };

        let exe = which::which(&hook.tool).map_err(|_| failed("not found on PATH".to_string()))?;
        debug!(tool = %hook.tool, exe = %exe.display(), ?args, "rendering hook");

        let output = Command::new(&exe)
            .args(&args)
            .output()
            .map_err(|e| failed(e.to_string()))?;
        if !output.status.success() {
            return Err(failed(format!("exited with {}", output.status)));
        }

        let cache = self.hook_cache_path(dialect, &hook.tool);
        atomic::write_if_changed(&cache, &output.stdout, 0o644).map_err(|source| {
            IntegrationError::Write {
                dialect: dialect.name(),
                path: cache.clone(),
                source,
            }
        })?;

        Ok(dialect.hook_lines(&hook.tool, &args, Some(&cache)))
    }
}
