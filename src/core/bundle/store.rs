//! Bundle store.
//!
//! A directory of `<bundle_id>.json` files, versioned alongside the policy.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::SecretBundle;
use crate::core::constants::BUNDLE_EXT;
use crate::core::domain::Identity;
use crate::core::policy::{RecipientPolicy, ResealPlan};
use crate::core::types::BundleId;
use crate::core::{atomic, validation};
use crate::error::{Result, SecretError};

/// Result of re-sealing one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResealOutcome {
    /// Recipients already matched the policy
    Unchanged,
    /// Bundle re-encrypted for the policy's recipients
    Resealed(ResealPlan),
}

/// Directory of sealed bundles.
#[derive(Debug, Clone)]
pub struct BundleStore {
    dir: PathBuf,
}

impl BundleStore {
    /// Open the store at `dir`. The directory need not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `id`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(self.relative_path(id))
    }

    /// Path of `id` relative to the store, as matched by policy rules
    pub fn relative_path(&self, id: &str) -> String {
        format!("{}.{}", id, BUNDLE_EXT)
    }

    /// Whether a bundle file exists for `id`
    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }

    /// Load and verify a bundle.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::MissingBundle` naming `id` when the file is
    /// absent, or a bundle parse/integrity error.
    pub fn load(&self, id: &str) -> Result<SecretBundle> {
        validation::validate_file_name(id)?;
        let path = self.path_for(id);
        debug!(bundle = id, path = %path.display(), "loading bundle");

        if !path.is_file() {
            return Err(SecretError::MissingBundle {
                bundle: id.to_string(),
                path,
            }
            .into());
        }

        let contents = fs::read_to_string(&path)?;
        SecretBundle::from_json(id, &contents)
    }

    /// Write a bundle as a whole file, atomically.
    pub fn save(&self, bundle: &SecretBundle) -> Result<()> {
        let path = self.path_for(bundle.id());
        debug!(bundle = bundle.id(), path = %path.display(), "saving bundle");

        let json = bundle.to_json()?;
        atomic::write_atomic(&path, json.as_bytes(), atomic::existing_mode(&path, 0o644))?;
        Ok(())
    }

    /// Every bundle id in the store, sorted.
    pub fn list(&self) -> Result<Vec<BundleId>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<BundleId> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == BUNDLE_EXT))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .filter(|id| validation::validate_file_name(id).is_ok())
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Set `field` in bundle `id`, creating the bundle if needed.
    ///
    /// A new bundle is sealed for the policy's recipients. An existing
    /// bundle keeps its recipients, and is refused with
    /// `PolicyError::Drift` when those no longer match the policy.
    pub fn seal_field(
        &self,
        policy: &RecipientPolicy,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<SecretBundle> {
        validation::validate_file_name(id)?;
        let rel = self.relative_path(id);

        let bundle = if self.exists(id) {
            let existing = self.load(id)?;
            policy.check(&existing, &rel)?;
            existing.with_field(field, value)?
        } else {
            let recipients = policy.resolve_age(&rel)?;
            SecretBundle::seal(id, [(field, value)], &recipients)?
        };

        self.save(&bundle)?;
        info!(bundle = id, field, "field sealed");
        Ok(bundle)
    }

    /// Re-seal bundle `id` for the policy's current recipients.
    ///
    /// The local identity must be able to open every field. Bundles that
    /// already match the policy are left untouched.
    pub fn reseal(
        &self,
        policy: &RecipientPolicy,
        identity: &Identity,
        id: &str,
    ) -> Result<ResealOutcome> {
        let bundle = self.load(id)?;
        let rel = self.relative_path(id);

        let Some(plan) = policy.drift(&bundle, &rel)? else {
            debug!(bundle = id, "recipients match policy");
            return Ok(ResealOutcome::Unchanged);
        };

        let resealed = bundle.reseal(identity, &policy.resolve_age(&rel)?)?;
        self.save(&resealed)?;

        info!(
            bundle = id,
            added = plan.added.len(),
            removed = plan.removed.len(),
            "bundle re-sealed"
        );
        Ok(ResealOutcome::Resealed(plan))
    }
}
