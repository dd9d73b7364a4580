//! Recipient policy.
//!
//! Maps bundle path patterns to the public keys allowed to decrypt them.
//! The policy never re-encrypts anything on its own: when a bundle's
//! recipients disagree with the policy that is reported as drift, and
//! fixing it is an explicit re-seal.
//!
//! ```toml
//! [hosts]
//! atlas = "age1..."
//!
//! [[rules]]
//! path = "^ai\\.json$"
//! recipients = ["atlas"]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use age::x25519;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::core::bundle::{BundleStore, SecretBundle};
use crate::core::domain::Recipient;
use crate::core::types::{BundleId, HostLabel, PublicKey};
use crate::error::{PolicyError, Result};

#[derive(Debug, Default, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    hosts: BTreeMap<HostLabel, PublicKey>,
    #[serde(default)]
    rules: Vec<RuleFile>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    path: String,
    recipients: Vec<String>,
}

/// One compiled policy rule.
#[derive(Debug)]
pub struct PolicyRule {
    pattern: Regex,
    recipients: Vec<Recipient>,
}

impl PolicyRule {
    /// The rule's path regex as written.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// A bundle whose recipients no longer match the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResealPlan {
    /// Bundle needing a re-seal
    pub bundle: BundleId,
    /// Keys the policy adds
    pub added: Vec<PublicKey>,
    /// Keys the policy removes
    pub removed: Vec<PublicKey>,
}

/// A bundle a dry run could not judge against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBundle {
    pub bundle: BundleId,
    pub reason: String,
}

/// Everything [`RecipientPolicy::dry_run`] found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DryRun {
    /// Bundles needing a re-seal
    pub plans: Vec<ResealPlan>,
    /// Bundles no rule covers, or that could not be read
    pub skipped: Vec<SkippedBundle>,
}

impl DryRun {
    /// Whether every evaluated bundle matches the policy.
    pub fn is_clean(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Ordered path-pattern rules; the first match wins.
#[derive(Debug)]
pub struct RecipientPolicy {
    rules: Vec<PolicyRule>,
}

impl RecipientPolicy {
    /// Load the policy from `path`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NotFound` if the file is absent, or a parse /
    /// validation error for malformed rules.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading policy");

        if !path.exists() {
            return Err(PolicyError::NotFound(path.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, path)
    }

    /// Parse policy TOML; `path` is only used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let file: PolicyFile = toml::from_str(contents).map_err(|source| PolicyError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut rules = Vec::with_capacity(file.rules.len());
        for rule in file.rules {
            let pattern = Regex::new(&rule.path).map_err(|source| PolicyError::InvalidPattern {
                pattern: rule.path.clone(),
                source,
            })?;
            if rule.recipients.is_empty() {
                return Err(PolicyError::EmptyRule(rule.path).into());
            }
            let recipients = rule
                .recipients
                .iter()
                .map(|entry| Recipient::resolve(entry, &file.hosts))
                .collect::<Result<Vec<_>>>()?;
            rules.push(PolicyRule {
                pattern,
                recipients,
            });
        }

        debug!(rules = rules.len(), "policy loaded");

        Ok(Self { rules })
    }

    /// Whether any rule covers `bundle_path`.
    pub fn governs(&self, bundle_path: &str) -> bool {
        self.rules.iter().any(|r| r.pattern.is_match(bundle_path))
    }

    /// Recipients authorized for `bundle_path` (relative to the store).
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NoMatchingRule` when no rule matches.
    pub fn resolve(&self, bundle_path: &str) -> Result<&[Recipient]> {
        let rule = self
            .rules
            .iter()
            .find(|r| r.pattern.is_match(bundle_path))
            .ok_or_else(|| PolicyError::NoMatchingRule(bundle_path.to_string()))?;

        trace!(bundle_path, pattern = rule.pattern(), "policy rule matched");
        Ok(&rule.recipients)
    }

    /// Authorized keys for `bundle_path`, deduplicated.
    pub fn resolve_keys(&self, bundle_path: &str) -> Result<BTreeSet<PublicKey>> {
        Ok(self
            .resolve(bundle_path)?
            .iter()
            .map(|r| r.public_key().to_string())
            .collect())
    }

    /// Parsed age recipients for `bundle_path`.
    pub fn resolve_age(&self, bundle_path: &str) -> Result<Vec<x25519::Recipient>> {
        self.resolve_keys(bundle_path)?
            .iter()
            .map(|k| crate::core::cipher::parse_recipient(k))
            .collect()
    }

    /// Compare a bundle's recipients against the policy.
    ///
    /// Returns `None` when they agree.
    pub fn drift(&self, bundle: &SecretBundle, bundle_path: &str) -> Result<Option<ResealPlan>> {
        let expected = self.resolve_keys(bundle_path)?;
        let used: BTreeSet<PublicKey> = bundle.recipients_used().iter().cloned().collect();

        if expected == used {
            return Ok(None);
        }

        Ok(Some(ResealPlan {
            bundle: bundle.id().to_string(),
            added: expected.difference(&used).cloned().collect(),
            removed: used.difference(&expected).cloned().collect(),
        }))
    }

    /// Fail with `PolicyError::Drift` if the bundle has drifted.
    pub fn check(&self, bundle: &SecretBundle, bundle_path: &str) -> Result<()> {
        match self.drift(bundle, bundle_path)? {
            None => Ok(()),
            Some(plan) => Err(PolicyError::Drift {
                bundle: plan.bundle,
                added: plan.added,
                removed: plan.removed,
            }
            .into()),
        }
    }

    /// Dry run: every bundle in `store` that needs a re-seal. Mutates nothing.
    ///
    /// Bundles outside every rule, and files that fail to load, are
    /// reported as skipped rather than ending the run.
    pub fn dry_run(&self, store: &BundleStore) -> Result<DryRun> {
        let mut report = DryRun::default();

        for id in store.list()? {
            let rel = store.relative_path(&id);
            if !self.governs(&rel) {
                debug!(bundle = %id, "no policy rule, skipping");
                report.skipped.push(SkippedBundle {
                    reason: format!("no policy rule matches {}", rel),
                    bundle: id,
                });
                continue;
            }

            let bundle = match store.load(&id) {
                Ok(bundle) => bundle,
                Err(e) => {
                    warn!(bundle = %id, error = %e, "unreadable bundle skipped");
                    report.skipped.push(SkippedBundle {
                        bundle: id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if let Some(plan) = self.drift(&bundle, &rel)? {
                report.plans.push(plan);
            }
        }

        debug!(
            drifted = report.plans.len(),
            skipped = report.skipped.len(),
            "policy dry run complete"
        );
        Ok(report)
    }
}
