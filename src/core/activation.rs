//! Activation pipeline.
//!
//! Runs the fixed stage sequence `links -> tools -> secrets -> shell`
//! against a loaded [`Config`]. Every stage is idempotent. A fatal error
//! stops the run and comes back wrapped in a [`StageError`]; non-fatal
//! errors (shell integration, policy drift) are collected as warnings on
//! the [`ActivationReport`]. Nothing is persisted between runs.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::core::bundle::BundleStore;
use crate::core::config::Config;
use crate::core::domain::{Identity, SecretBinding};
use crate::core::links::{Link, LinkOutcome};
use crate::core::materialize::{MaterializedSecret, Materializer};
use crate::core::policy::RecipientPolicy;
use crate::core::shell::{ShellArtifact, ShellIntegrator};
use crate::core::tools::{self, ToolOutcome};
use crate::error::{ConfigError, Error, Result, StageError};

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Links,
    Tools,
    Secrets,
    Shell,
}

impl Stage {
    /// Execution order.
    pub const ORDER: [Stage; 4] = [Stage::Links, Stage::Tools, Stage::Secrets, Stage::Shell];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Links => "links",
            Stage::Tools => "tools",
            Stage::Secrets => "secrets",
            Stage::Shell => "shell",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A non-fatal problem recorded during a run.
#[derive(Debug)]
pub struct Warning {
    pub stage: Stage,
    pub error: Error,
}

/// Everything a successful run did.
#[derive(Debug, Default)]
pub struct ActivationReport {
    pub links: Vec<(Link, LinkOutcome)>,
    pub tools: Vec<(String, ToolOutcome)>,
    pub secrets: Vec<MaterializedSecret>,
    pub shells: Vec<ShellArtifact>,
    pub warnings: Vec<Warning>,
}

impl ActivationReport {
    fn warn(&mut self, stage: Stage, error: Error) {
        warn!(stage = %stage, error = %error, "continuing after non-fatal error");
        self.warnings.push(Warning { stage, error });
    }
}

/// Runs the pipeline for one host configuration.
pub struct Activation<'a> {
    config: &'a Config,
    home: PathBuf,
}

impl<'a> Activation<'a> {
    /// Activation rooted at the current user's home directory.
    pub fn new(config: &'a Config) -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::with_home(config, home))
    }

    /// Activation with an explicit home, where shell entrypoints live.
    pub fn with_home(config: &'a Config, home: impl Into<PathBuf>) -> Self {
        Self {
            config,
            home: home.into(),
        }
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Stage` naming the stage that failed fatally.
    pub fn run(&self) -> Result<ActivationReport> {
        let mut report = ActivationReport::default();

        for stage in Stage::ORDER {
            debug!(stage = %stage, "stage started");
            let result = match stage {
                Stage::Links => self.links(&mut report),
                Stage::Tools => self.tools(&mut report),
                Stage::Secrets => self.secrets(&mut report),
                Stage::Shell => self.shell(&mut report),
            };
            result.map_err(|e| StageError::new(stage, e))?;
        }

        info!(
            links = report.links.len(),
            tools = report.tools.len(),
            secrets = report.secrets.len(),
            shells = report.shells.len(),
            warnings = report.warnings.len(),
            "activation complete"
        );
        Ok(report)
    }

    fn links(&self, report: &mut ActivationReport) -> Result<()> {
        for decl in &self.config.links {
            let link = Link::new(
                self.config.resolve(&decl.source)?,
                self.config.resolve(&decl.target)?,
            );
            let outcome = link.ensure()?;
            report.links.push((link, outcome));
        }
        Ok(())
    }

    fn tools(&self, report: &mut ActivationReport) -> Result<()> {
        for tool in &self.config.tools {
            let outcome = tools::ensure_tool(&tool.name, &tool.install)?;
            report.tools.push((tool.name.clone(), outcome));
        }
        Ok(())
    }

    fn secrets(&self, report: &mut ActivationReport) -> Result<()> {
        let bindings = self.config.bindings()?;
        if bindings.is_empty() {
            debug!("no secrets declared");
            return Ok(());
        }

        let identity = Identity::load(&self.config.identity_path()?, &self.config.host_label())?;
        let store = BundleStore::new(self.config.store_dir()?);

        let materializer = Materializer::new(&store, &identity);
        report.secrets = materializer.materialize_all(&bindings)?;

        self.check_drift(&store, &bindings, report)?;
        Ok(())
    }

    /// Warn about referenced bundles whose recipients lag the policy.
    fn check_drift(
        &self,
        store: &BundleStore,
        bindings: &[SecretBinding],
        report: &mut ActivationReport,
    ) -> Result<()> {
        let policy_path = self.config.policy_path()?;
        if !policy_path.is_file() {
            debug!(path = %policy_path.display(), "no policy, skipping drift check");
            return Ok(());
        }

        let policy = match RecipientPolicy::load(&policy_path) {
            Ok(policy) => policy,
            Err(e) => {
                report.warn(Stage::Secrets, e);
                return Ok(());
            }
        };

        for id in Materializer::bundles_referenced(bindings) {
            let checked = store
                .load(id)
                .and_then(|bundle| policy.check(&bundle, &store.relative_path(id)));
            if let Err(e) = checked {
                report.warn(Stage::Secrets, e);
            }
        }
        Ok(())
    }

    fn shell(&self, report: &mut ActivationReport) -> Result<()> {
        let dialects = &self.config.shell.dialects;
        if dialects.is_empty() {
            return Ok(());
        }

        let bindings = self.config.bindings()?;
        let integrator = ShellIntegrator::new(self.config.shell_state_dir()?, &self.home);

        for &dialect in dialects {
            match integrator.integrate(dialect, &bindings, &self.config.shell.hooks) {
                Ok(mut artifact) => {
                    for w in artifact.warnings.drain(..) {
                        report.warn(Stage::Shell, w.into());
                    }
                    report.shells.push(artifact);
                }
                Err(e) if !e.is_fatal() => report.warn(Stage::Shell, e),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
