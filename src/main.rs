//! Kindle - declarative host activation for secrets and shells.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kindle::cli::output;
use kindle::cli::{execute, Cli};
use kindle::error::{ConfigError, Error, PolicyError, SecretError, StoreError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("KINDLE_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("kindle=debug")
        } else {
            EnvFilter::new("kindle=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .init();

    if let Err(e) = execute(cli.command, cli.config) {
        output::error(&e.to_string());
        if let Some(hint) = suggestion(&e) {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

fn suggestion(e: &Error) -> Option<&'static str> {
    let inner = match e {
        Error::Stage(stage) => stage.inner(),
        other => other,
    };
    match inner {
        Error::Config(ConfigError::NoHomeDir) => Some("set HOME or pass --config"),
        Error::Store(StoreError::NoPrivateKey(_)) => Some("run: kindle init"),
        Error::Secret(SecretError::Decryption { .. }) => {
            Some("this host is not a recipient; add it to the policy and run: kindle reseal")
        }
        Error::Policy(PolicyError::Drift { .. }) => Some("run: kindle reseal"),
        _ => None,
    }
}
