//! Activate command.
//!
//! Runs the full pipeline and summarizes what changed.

use crate::cli::output;
use crate::core::activation::Activation;
use crate::core::config::Config;
use crate::core::links::LinkOutcome;
use crate::core::tools::ToolOutcome;
use crate::error::Result;

/// Activate this host.
pub fn execute(config: &Config) -> Result<()> {
    let report = Activation::new(config)?.run()?;

    for (link, outcome) in &report.links {
        if *outcome != LinkOutcome::Unchanged {
            output::success(&format!(
                "linked {} -> {}",
                output::path(link.target.display()),
                output::path(link.source.display())
            ));
        }
    }

    for (name, outcome) in &report.tools {
        if *outcome == ToolOutcome::Installed {
            output::success(&format!("installed {}", output::key(name)));
        }
    }

    if !report.secrets.is_empty() {
        output::success(&format!("materialized {} secret(s)", report.secrets.len()));
    }

    for artifact in &report.shells {
        if artifact.entrypoint.is_write() {
            output::success(&format!(
                "{} now sources {}",
                output::path(artifact.entrypoint_path.display()),
                output::path(artifact.snippet_path.display())
            ));
        }
    }

    if report.warnings.is_empty() {
        output::success("activated");
    } else {
        for w in &report.warnings {
            output::warn(&format!("[{}] {}", w.stage, w.error));
        }
        output::warn(&format!(
            "activated with {} warning(s)",
            report.warnings.len()
        ));
    }

    Ok(())
}
