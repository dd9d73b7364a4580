//! Init command.
//!
//! Generates the host identity and, on a fresh host, a starter config.

use std::path::PathBuf;

use tracing::info;

use crate::cli::{config_path, output};
use crate::core::config::Config;
use crate::core::domain::Identity;
use crate::error::Result;

/// Generate this host's identity.
pub fn execute(config: Option<PathBuf>, label: Option<String>, force: bool) -> Result<()> {
    let path = config_path(config)?;

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        Config::new(&path)
    };

    let relabeled = label.is_some();
    if let Some(label) = label {
        config.host.label = Some(label);
    }
    let host = config.host_label();

    let identity_path = config.identity_path()?;
    let identity = Identity::generate(&identity_path, &host, force)?;
    info!(host = %host, path = %identity_path.display(), "identity generated");

    if !path.exists() || relabeled {
        config.save()?;
    }

    output::success(&format!("generated identity for {}", output::key(&host)));
    output::kv("identity:", output::path(identity_path.display()));
    output::kv("config:  ", output::path(path.display()));
    output::kv("public:  ", identity.public_key());
    output::hint("add the public key to the recipient policy, then run: kindle reseal");

    Ok(())
}
