//! Command-line interface.

pub mod activate;
pub mod completions;
pub mod init;
pub mod output;
pub mod reseal;
pub mod seal;
pub mod whoami;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::config::Config;
use crate::error::Result;

/// Kindle - declarative host activation for secrets and shells.
#[derive(Parser)]
#[command(
    name = "kindle",
    about = "Materialize age-sealed secrets and wire them into your shells",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to kindle.toml (default: ~/.config/kindle/kindle.toml)
    #[arg(long, global = true, env = "KINDLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Run links, tools, secrets, and shell integration for this host
    Activate,

    /// Generate this host's identity
    Init {
        /// Host label (default: hostname)
        #[arg(short, long)]
        label: Option<String>,
        /// Replace an existing identity
        #[arg(short, long)]
        force: bool,
    },

    /// Print this host's label and public key
    Whoami,

    /// Seal a field into a bundle
    Seal {
        /// Bundle id (e.g. ai)
        bundle: String,
        /// Field name (e.g. OPENAI_API_KEY)
        field: String,
        /// Value; prompted for, or read from stdin, when omitted
        value: Option<String>,
    },

    /// Re-seal bundles whose recipients lag the policy
    Reseal {
        /// Bundles to re-seal (default: all)
        bundles: Vec<String>,
        /// Only list drifted bundles
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command, config: Option<PathBuf>) -> Result<()> {
    use Command::*;

    match command {
        Activate => activate::execute(&load_config(config)?),
        Init { label, force } => init::execute(config, label, force),
        Whoami => whoami::execute(&load_config(config)?),
        Seal {
            bundle,
            field,
            value,
        } => seal::execute(&load_config(config)?, &bundle, &field, value),
        Reseal { bundles, dry_run } => reseal::execute(&load_config(config)?, &bundles, dry_run),
        Completions { shell } => completions::execute(shell),
    }
}

/// Config location from the flag or environment, else the default.
pub fn config_path(config: Option<PathBuf>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(path),
        None => Config::default_path(),
    }
}

fn load_config(config: Option<PathBuf>) -> Result<Config> {
    Config::load(&config_path(config)?)
}
