//! Shell integration.
//!
//! Each supported dialect gets a generated snippet that exports the
//! materialized secrets by path and runs tool init hooks, plus one managed
//! reference to that snippet in the user's own entrypoint config.

mod entrypoint;
mod integrator;
mod snippet;

pub use entrypoint::{ensure_reference, EntrypointChange};
pub use integrator::{ShellArtifact, ShellIntegrator};
pub use snippet::render;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A supported interactive shell syntax family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellDialect {
    Fish,
    Nushell,
    Zsh,
    Bash,
}

impl ShellDialect {
    /// Every dialect, in integration order.
    pub const ALL: [ShellDialect; 4] = [Self::Fish, Self::Nushell, Self::Zsh, Self::Bash];

    /// Config name, also substituted for `{shell}` in hook arguments
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fish => "fish",
            Self::Nushell => "nushell",
            Self::Zsh => "zsh",
            Self::Bash => "bash",
        }
    }

    /// Script file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Fish => "fish",
            Self::Nushell => "nu",
            Self::Zsh => "zsh",
            Self::Bash => "bash",
        }
    }

    /// The user-owned config file this dialect reads at startup
    pub fn entrypoint_path(&self, home: &Path) -> PathBuf {
        match self {
            Self::Fish => home.join(".config/fish/config.fish"),
            Self::Nushell => home.join(".config/nushell/config.nu"),
            Self::Zsh => home.join(".zshrc"),
            Self::Bash => home.join(".bashrc"),
        }
    }

    /// Generated snippet file name
    pub fn snippet_file_name(&self) -> String {
        format!("init.{}", self.extension())
    }

    /// Line that loads `snippet` from the entrypoint
    pub fn reference_line(&self, snippet: &Path) -> String {
        let p = self.quote(&snippet.display().to_string());
        match self {
            Self::Fish => format!("test -f {p}; and source {p}"),
            // Nushell resolves `source` at parse time; the snippet is always
            // written before the reference is added.
            Self::Nushell => format!("source {p}"),
            Self::Zsh | Self::Bash => format!("[ -f {p} ] && . {p}"),
        }
    }

    /// Export `env` from the file at `path`, read when the shell starts
    pub fn export_line(&self, env: &str, path: &Path) -> String {
        let p = self.quote(&path.display().to_string());
        match self {
            Self::Fish => format!("test -r {p}; and set -gx {env} (cat {p} | string collect)"),
            Self::Nushell => format!(
                "load-env (if ({p} | path exists) {{ {{ {env}: (open --raw {p} | str trim) }} }} else {{ {{}} }})"
            ),
            Self::Zsh | Self::Bash => {
                format!("if [ -r {p} ]; then export {env}=\"$(cat {p})\"; fi")
            }
        }
    }

    /// Lines that run `tool args...` as an init hook.
    ///
    /// Nushell cannot evaluate generated code at startup, so its hook is a
    /// `source` of output rendered at activation time (`cache`). Without a
    /// cache there is nothing to emit.
    pub fn hook_lines(&self, tool: &str, args: &[String], cache: Option<&Path>) -> Option<String> {
        let command = std::iter::once(tool.to_string())
            .chain(args.iter().map(|a| self.quote_arg(a)))
            .collect::<Vec<_>>()
            .join(" ");

        match self {
            Self::Fish => Some(format!("if type -q {tool}\n    {command} | source\nend")),
            Self::Nushell => cache.map(|c| format!("source {}", self.quote(&c.display().to_string()))),
            Self::Zsh | Self::Bash => Some(format!(
                "if command -v {tool} >/dev/null 2>&1; then\n    eval \"$({command})\"\nfi"
            )),
        }
    }

    /// Quote a string literal for this dialect
    pub fn quote(&self, s: &str) -> String {
        match self {
            Self::Fish => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Self::Nushell => {
                if s.contains('\'') {
                    format!("r#'{}'#", s)
                } else {
                    format!("'{}'", s)
                }
            }
            Self::Zsh | Self::Bash => format!("'{}'", s.replace('\'', "'\\''")),
        }
    }

    /// Quote a command argument only when it needs it
    fn quote_arg(&self, s: &str) -> String {
        let plain = !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':'));
        if plain {
            s.to_string()
        } else {
            self.quote(s)
        }
    }
}

impl std::fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
