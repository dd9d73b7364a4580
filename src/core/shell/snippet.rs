//! Snippet rendering.

use super::ShellDialect;
use crate::core::domain::SecretBinding;

/// Render the snippet for `dialect`.
///
/// Output depends only on its inputs, so regenerating it for an unchanged
/// configuration produces identical bytes. Exports reference runtime paths;
/// no secret value ever appears in a snippet.
pub fn render(dialect: ShellDialect, bindings: &[SecretBinding], hooks: &[String]) -> String {
    let mut out = String::new();
    out.push_str("# Generated by kindle. Changes are overwritten on activation.\n");
    out.push_str(&format!("# dialect: {}\n", dialect.name()));

    if !bindings.is_empty() {
        out.push('\n');
        for binding in bindings {
            out.push_str(&dialect.export_line(binding.env_name(), binding.runtime_path()));
            out.push('\n');
        }
    }

    for hook in hooks {
        out.push('\n');
        out.push_str(hook);
        out.push('\n');
    }

    out
}
