//! Whoami command - print this host's label and public key.

use crate::cli::output;
use crate::core::config::Config;
use crate::core::domain::Identity;
use crate::error::Result;

/// Print host label and public key.
///
/// The key goes to stdout alone so it can be piped into a policy file.
pub fn execute(config: &Config) -> Result<()> {
    let identity = Identity::load(&config.identity_path()?, &config.host_label())?;

    output::data(&format!("{}  {}", identity.host_label(), identity.public_key()));
    Ok(())
}
