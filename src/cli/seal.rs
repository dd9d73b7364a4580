//! Seal command.
//!
//! Encrypt one field into a bundle for the recipients the policy names.

use std::io::{self, IsTerminal, Read};

use dialoguer::Password;
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::core::bundle::BundleStore;
use crate::core::config::Config;
use crate::core::policy::RecipientPolicy;
use crate::core::validation;
use crate::error::Result;

/// Seal `field` into `bundle`.
pub fn execute(config: &Config, bundle: &str, field: &str, value: Option<String>) -> Result<()> {
    info!(bundle, field, "sealing field");

    validation::validate_file_name(bundle)?;
    validation::validate_key(field)?;

    let value = match value {
        Some(v) => Zeroizing::new(v),
        None => Zeroizing::new(read_value(field)?),
    };
    validation::validate_value(field, &value)?;

    let policy = RecipientPolicy::load(&config.policy_path()?)?;
    let store = BundleStore::new(config.store_dir()?);
    let sealed = store.seal_field(&policy, bundle, field, &value)?;

    output::success(&format!(
        "sealed {}:{}",
        output::key(bundle),
        output::key(field)
    ));
    output::kv("recipients:", sealed.recipients_used().len());
    output::kv("file:      ", output::path(store.path_for(bundle).display()));

    Ok(())
}

/// Hidden prompt on a terminal; otherwise the whole of stdin.
fn read_value(field: &str) -> Result<String> {
    if io::stdin().is_terminal() {
        return Ok(Password::new()
            .with_prompt(format!("Value for {}", output::key(field)))
            .interact()?);
    }

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let trimmed = input.trim_end_matches(&['\n', '\r'][..]).len();
    input.truncate(trimmed);
    Ok(input)
}
