//! Reseal command.
//!
//! Brings bundles back in line with the recipient policy. With
//! `--dry-run`, only lists what would change.

use crate::cli::output;
use crate::core::bundle::{BundleStore, ResealOutcome};
use crate::core::config::Config;
use crate::core::domain::Identity;
use crate::core::policy::{RecipientPolicy, ResealPlan, SkippedBundle};
use crate::error::{Error, Result};

/// Re-seal `bundles` (all when empty) for the current policy.
///
/// Named bundles must be covered by the policy and readable. When sweeping
/// the whole store, bundles outside every rule and unreadable files are
/// skipped and reported.
pub fn execute(config: &Config, bundles: &[String], dry_run: bool) -> Result<()> {
    let policy = RecipientPolicy::load(&config.policy_path()?)?;
    let store = BundleStore::new(config.store_dir()?);

    let selected = |id: &str| bundles.is_empty() || bundles.iter().any(|b| b == id);

    if dry_run {
        let report = policy.dry_run(&store)?;
        let plans: Vec<&ResealPlan> = report.plans.iter().filter(|p| selected(&p.bundle)).collect();
        let skipped: Vec<&SkippedBundle> =
            report.skipped.iter().filter(|s| selected(&s.bundle)).collect();

        if plans.is_empty() {
            output::success("all bundles match the policy");
        } else {
            output::header("Bundles needing a re-seal");
            output::rule();
            for plan in &plans {
                print_plan(plan);
            }
        }
        print_skipped(&skipped);
        if !plans.is_empty() {
            output::hint("run: kindle reseal");
        }
        return Ok(());
    }

    let sweep = bundles.is_empty();
    let ids = if sweep { store.list()? } else { bundles.to_vec() };

    let identity = Identity::load(&config.identity_path()?, &config.host_label())?;

    let mut resealed = 0;
    let mut skipped = Vec::new();
    for id in &ids {
        let rel = store.relative_path(id);
        if sweep && !policy.governs(&rel) {
            skipped.push(SkippedBundle {
                bundle: id.clone(),
                reason: format!("no policy rule matches {}", rel),
            });
            continue;
        }

        match store.reseal(&policy, &identity, id) {
            Ok(ResealOutcome::Resealed(plan)) => {
                resealed += 1;
                output::success(&format!("re-sealed {}", output::key(&plan.bundle)));
            }
            Ok(ResealOutcome::Unchanged) => {}
            Err(Error::Bundle(e)) if sweep => skipped.push(SkippedBundle {
                bundle: id.clone(),
                reason: e.to_string(),
            }),
            Err(e) => return Err(e),
        }
    }

    if resealed == 0 {
        output::success("all bundles match the policy");
    }
    print_skipped(&skipped.iter().collect::<Vec<_>>());
    Ok(())
}

fn print_plan(plan: &ResealPlan) {
    output::list_item(&plan.bundle);
    for key in &plan.added {
        output::kv("  + ", key);
    }
    for key in &plan.removed {
        output::kv("  - ", key);
    }
}

fn print_skipped(skipped: &[&SkippedBundle]) {
    if skipped.is_empty() {
        return;
    }
    output::section("Skipped");
    for entry in skipped {
        output::list_item(&entry.bundle);
        output::dimmed(&format!("    {}", entry.reason));
    }
}
